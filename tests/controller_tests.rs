//! End-to-end tests for the mount controller against mock and simulated channels

use synscan_mount::{
    hal::{MockOpener, SimulatedMount},
    Equatorial, Horizontal, MirrorSettle, MountConfig, MountController, MountError, PointingMode,
    PrecisionMode, TrackingMode,
};

fn sim_controller(sim: SimulatedMount) -> MountController<SimulatedMount> {
    MountController::new(sim)
}

// ============================================================================
// Goto and Sync
// ============================================================================

#[test]
fn goto_then_read_back_coarse() {
    let mut mount = sim_controller(SimulatedMount::new());
    mount.goto_ra_dec(Equatorial::new(187.5, 45.5)).unwrap();

    let here = mount.ra_dec().unwrap();
    assert!((here.ra - 187.5).abs() < 0.01);
    assert!((here.dec - 45.5).abs() < 0.01);
}

#[test]
fn goto_then_read_back_precise() {
    let mut mount = sim_controller(SimulatedMount::new());
    mount.set_precision(PrecisionMode::Precise);
    mount.goto_azm_alt(Horizontal::new(123.456, 33.3)).unwrap();

    let here = mount.azm_alt().unwrap();
    assert!((here.azm - 123.456).abs() < 1e-4);
    assert!((here.alt - 33.3).abs() < 1e-4);
    assert_eq!(mount.channel().unwrap().received.last().unwrap(), b"z");
}

#[test]
fn southern_declination_wraps_on_the_wire() {
    let mut mount = sim_controller(SimulatedMount::new());
    mount.goto_ra_dec_text("05 35 17.3-05 23 28.0").unwrap();

    let here = mount.ra_dec().unwrap();
    assert!(here.dec > 350.0, "raw dec {}", here.dec);
    assert!((synscan_mount::coords::signed_degrees(here.dec) + 5.391).abs() < 0.01);
}

#[test]
fn sync_text_relabels_position() {
    let mut mount = sim_controller(SimulatedMount::new());
    mount.sync_ra_dec_text("06 00 00.0+10 00 00.0").unwrap();

    let here = mount.ra_dec().unwrap();
    assert!((here.ra - 90.0).abs() < 0.01);
    assert!((here.dec - 10.0).abs() < 0.01);
    assert_eq!(mount.channel().unwrap().received[0], b"S4000,071C");
}

#[test]
fn goto_azm_alt_text() {
    let mut mount = sim_controller(SimulatedMount::new());
    mount.goto_azm_alt_text("180,45").unwrap();
    assert_eq!(mount.channel().unwrap().received[0], b"B8000,2000");
}

// ============================================================================
// Mirror Pointing
// ============================================================================

#[test]
fn mirror_goto_corrects_altitude() {
    let sim = SimulatedMount::new().with_azm_alt(Horizontal::new(100.0, 60.0));
    let mut mount = sim_controller(sim);
    mount.set_pointing_mode(PointingMode::Mirror);

    let corrected = mount
        .goto_ra_dec(Equatorial::new(250.0, 36.0))
        .unwrap()
        .expect("mirror mode returns the corrected target");
    assert!((corrected.azm - 100.0).abs() < 1e-3);
    assert!((corrected.alt - 75.0).abs() < 1e-3);

    let received = &mount.channel().unwrap().received;
    let codes: Vec<u8> = received.iter().map(|f| f[0]).collect();
    assert_eq!(codes, vec![b'R', b'z', b'b']);

    // The mount ends up at the corrected position
    let sim = mount.channel().unwrap();
    assert!((sim.azm_alt.alt - 75.0).abs() < 1e-3);
}

#[test]
fn mirror_correction_always_uses_precise_commands() {
    let sim = SimulatedMount::new().with_azm_alt(Horizontal::new(10.0, 30.0));
    let config = MountConfig::default().with_pointing(PointingMode::Mirror);
    let mut mount = MountController::with_config(sim, &config);
    assert_eq!(mount.state().precision, PrecisionMode::Coarse);

    mount.goto_ra_dec(Equatorial::new(1.0, 2.0)).unwrap();
    let received = &mount.channel().unwrap().received;
    assert_eq!(received[0][0], b'R');
    assert_eq!(received[1], b"z");
    assert_eq!(received[2][0], b'b');
    assert_eq!(received[2].len(), 18);
}

#[test]
fn mirror_correction_waits_for_slew() {
    let sim = SimulatedMount::new()
        .with_azm_alt(Horizontal::new(200.0, 20.0))
        .with_slew_polls(2);
    let config = MountConfig::default()
        .with_pointing(PointingMode::Mirror)
        .with_settle(MirrorSettle::poll(0, 5));
    let mut mount = MountController::with_config(sim, &config);

    let corrected = mount.goto_ra_dec(Equatorial::new(1.0, 2.0)).unwrap().unwrap();
    assert!((corrected.alt - 55.0).abs() < 1e-3);

    let codes: Vec<u8> = mount
        .channel()
        .unwrap()
        .received
        .iter()
        .map(|f| f[0])
        .collect();
    assert_eq!(codes, vec![b'R', b'L', b'L', b'L', b'z', b'b']);
}

// ============================================================================
// Tracking State
// ============================================================================

#[test]
fn tracking_state_follows_every_mode() {
    let mut mount = sim_controller(SimulatedMount::new());
    for mode in TrackingMode::ALL {
        mount.set_tracking(mode).unwrap();
        let state = mount.state();
        assert_eq!(state.last_commanded_tracking(), Some(mode));
        assert_eq!(state.is_stopped(), mode == TrackingMode::Off);
        assert_eq!(state.is_tracking(), mode != TrackingMode::Off);
        assert_eq!(mount.channel().unwrap().tracking, Some(mode));
    }
}

#[test]
fn out_of_range_tracking_is_never_sent() {
    let mut mount = sim_controller(SimulatedMount::new());
    for raw in [4u8, 7, 255] {
        assert!(matches!(
            mount.set_tracking_mode(raw),
            Err(MountError::ArgumentError(_))
        ));
    }
    assert!(mount.channel().unwrap().received.is_empty());
}

#[test]
fn stop_cancels_slew_and_turns_tracking_off() {
    let sim = SimulatedMount::new().with_slew_polls(10);
    let mut mount = sim_controller(sim);
    mount.set_tracking(TrackingMode::AltAz).unwrap();
    mount.goto_azm_alt(Horizontal::new(45.0, 45.0)).unwrap();
    assert!(mount.is_slewing().unwrap());

    mount.stop().unwrap();
    assert!(!mount.is_slewing().unwrap());
    assert!(mount.state().is_stopped());
    assert_eq!(mount.channel().unwrap().tracking, Some(TrackingMode::Off));
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[test]
fn reconnect_after_device_returns() {
    let mut opener = MockOpener::unavailable();
    opener.responses.push_back(b"0#".to_vec());
    let mut mount = MountController::new(opener);
    assert!(!mount.is_connected());
    assert_eq!(mount.is_slewing(), Err(MountError::Disconnected));

    // Device plugged in
    mount.opener_mut().fail_open = false;
    mount.reconnect().unwrap();
    assert!(mount.is_connected());
    assert_eq!(mount.is_slewing(), Ok(false));
}

#[test]
fn reconnect_is_idempotent() {
    let mut mount = MountController::new(MockOpener::new());
    for _ in 0..3 {
        mount.reconnect().unwrap();
    }
    assert_eq!(mount.opener().open_count, 1);
    assert_eq!(mount.opener().closed_count(), 0);
}

#[test]
fn disconnect_then_reconnect_opens_fresh_channel() {
    let mut mount = MountController::new(MockOpener::new().with_responses([b"#".to_vec()]));
    mount.cancel_goto().unwrap();
    mount.disconnect();
    assert_eq!(mount.cancel_goto(), Err(MountError::Disconnected));

    mount.reconnect().unwrap();
    assert!(mount.channel().unwrap().writes.is_empty());
    assert_eq!(mount.opener().open_count, 2);
    assert_eq!(mount.opener().closed_count(), 1);
}

#[test]
fn channel_closed_exactly_once_on_drop() {
    let opener = MockOpener::new();
    let probe = opener.clone();
    {
        let mut mount = MountController::new(opener);
        mount.disconnect();
        assert_eq!(probe.closed_count(), 1);
    }
    assert_eq!(probe.closed_count(), 1);

    let opener = MockOpener::new();
    let probe = opener.clone();
    drop(MountController::new(opener));
    assert_eq!(probe.closed_count(), 1);
}

// ============================================================================
// Information Queries
// ============================================================================

#[test]
fn info_queries_against_simulator() {
    let mut sim = SimulatedMount::new();
    sim.model = 11;
    sim.aligned = false;
    sim.pier_side = synscan_mount::PierSide::West;
    let mut mount = sim_controller(sim);

    let version = mount.version().unwrap();
    assert_eq!((version.major, version.minor), (4, 39));
    assert_eq!(mount.model(), Ok(11));
    assert_eq!(mount.is_alignment_complete(), Ok(false));
    assert_eq!(mount.pier_side(), Ok(synscan_mount::PierSide::West));
    mount.echo(b'#').unwrap();
}
