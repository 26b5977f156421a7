//! Command-line control for a SynScan / NexStar mount on a serial port.
//!
//! Each invocation opens the port, runs one subcommand, and exits. `watch`
//! stays running and prints the position periodically, reconnecting when
//! the hand controller goes away.
//!
//! # Usage
//!
//! ```bash
//! mountctl --port /dev/ttyUSB0 status
//! mountctl goto-radec "05 35 17.3-05 23 28.0"
//! mountctl --mirror goto-radec "18 36 56.3+38 47 01.0"
//! mountctl goto-azmalt "180,45"
//! mountctl track 2
//! mountctl watch --interval-ms 1000
//! ```
//!
//! Set `RUST_LOG=debug` to see every frame on the wire.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use synscan_mount::coords::{format_pretty_equatorial, signed_degrees};
use synscan_mount::hal::SerialOpener;
use synscan_mount::{
    Config, MountConfig, MountController, MountError, PointingMode, PrecisionMode, SerialConfig,
};

#[derive(Parser, Debug)]
#[command(name = "mountctl")]
#[command(about = "SynScan / NexStar mount control over a serial port")]
struct Args {
    /// Serial port path
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(long, default_value = "9600")]
    baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u32,

    /// Use 24-bit precise commands
    #[arg(long)]
    precise: bool,

    /// Apply the mirror altitude correction after RA/Dec gotos
    #[arg(long)]
    mirror: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print connection, modes, and current position
    Status,
    /// Goto "hh mm ss.s+dd mm ss.s"
    GotoRadec {
        /// Target, e.g. "12 30 00.0+45 30 00.0"
        target: String,
    },
    /// Goto "azm,alt" in decimal degrees
    GotoAzmalt {
        /// Target, e.g. "180,45"
        target: String,
    },
    /// Sync the mount to "hh mm ss.s+dd mm ss.s"
    Sync {
        /// Current true position
        target: String,
    },
    /// Set tracking: 0 = off, 1 = alt/az, 2 = equatorial, 3 = PEC
    Track {
        /// Tracking mode
        mode: u8,
    },
    /// Abort a goto in progress
    Cancel,
    /// Abort any goto and turn tracking off
    Stop,
    /// Print firmware version, model, alignment, and pier side
    Info,
    /// Print the position periodically, reconnecting as needed
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "2000")]
        interval_ms: u64,

        /// Number of polls (0 = infinite)
        #[arg(short, long, default_value = "0")]
        count: u64,
    },
}

type Mount = MountController<SerialOpener>;

impl Args {
    fn config(&self) -> Config {
        let precision = if self.precise {
            PrecisionMode::Precise
        } else {
            PrecisionMode::Coarse
        };
        let pointing = if self.mirror {
            PointingMode::Mirror
        } else {
            PointingMode::Telescope
        };

        Config::default()
            .with_serial(
                SerialConfig::default()
                    .with_port(&self.port)
                    .with_baud(self.baud)
                    .with_timeout_ms(self.timeout_ms),
            )
            .with_mount(
                MountConfig::default()
                    .with_precision(precision)
                    .with_pointing(pointing),
            )
    }
}

fn print_position(mount: &mut Mount) -> Result<()> {
    let eq = mount.ra_dec().context("Failed to read RA/Dec")?;
    let (ra, dec) = format_pretty_equatorial(eq.ra, signed_degrees(eq.dec));
    let hz = mount.azm_alt().context("Failed to read Azm/Alt")?;
    let slewing = mount.is_slewing().context("Failed to read slew state")?;

    println!("RA  {ra}");
    println!("Dec {dec}");
    println!("Azm {:.4}  Alt {:.4}", hz.azm, signed_degrees(hz.alt));
    println!("Slewing: {slewing}");
    Ok(())
}

fn status(mount: &mut Mount) -> Result<()> {
    let state = mount.state();
    println!("Connected: {}", state.connected);
    println!("Precision: {:?}", state.precision);
    println!("Pointing:  {:?}", state.pointing);
    print_position(mount)
}

fn info(mount: &mut Mount) -> Result<()> {
    let version = mount.version().context("Failed to read firmware version")?;
    let model = mount.model().context("Failed to read model")?;
    let aligned = mount
        .is_alignment_complete()
        .context("Failed to read alignment state")?;
    println!("Firmware:  {version}");
    println!("Model id:  {model}");
    println!("Aligned:   {aligned}");

    // Not every hand controller answers this one
    match mount.pier_side() {
        Ok(side) => println!("Pier side: {side:?}"),
        Err(e) => warn!("Pier side unavailable: {e}"),
    }
    Ok(())
}

fn watch(mount: &mut Mount, interval_ms: u64, count: u64, reconnect_ms: u32) -> Result<()> {
    let mut polls = 0u64;
    loop {
        if mount.is_connected() {
            if let Err(e) = print_position(mount) {
                warn!("{e:#}");
                let link_lost = e
                    .downcast_ref::<MountError>()
                    .is_some_and(|e| e.is_link_error());
                if link_lost {
                    mount.disconnect();
                }
            }
            thread::sleep(Duration::from_millis(interval_ms));
        } else {
            info!("Not connected, retrying in {reconnect_ms} ms");
            thread::sleep(Duration::from_millis(u64::from(reconnect_ms)));
            let _ = mount.reconnect();
        }

        polls += 1;
        if count > 0 && polls >= count {
            return Ok(());
        }
    }
}

fn run(mount: &mut Mount, command: Cmd, reconnect_ms: u32) -> Result<()> {
    if !matches!(command, Cmd::Watch { .. }) && !mount.is_connected() {
        bail!("Mount not connected");
    }

    match command {
        Cmd::Status => status(mount),
        Cmd::GotoRadec { target } => {
            match mount
                .goto_ra_dec_text(&target)
                .with_context(|| format!("Goto {target:?} failed"))?
            {
                Some(corrected) => println!(
                    "Goto sent, mirror corrected to Azm {:.4} Alt {:.4}",
                    corrected.azm, corrected.alt
                ),
                None => println!("Goto sent"),
            }
            Ok(())
        }
        Cmd::GotoAzmalt { target } => {
            mount
                .goto_azm_alt_text(&target)
                .with_context(|| format!("Goto {target:?} failed"))?;
            println!("Goto sent");
            Ok(())
        }
        Cmd::Sync { target } => {
            mount
                .sync_ra_dec_text(&target)
                .with_context(|| format!("Sync to {target:?} failed"))?;
            println!("Synced");
            Ok(())
        }
        Cmd::Track { mode } => {
            mount
                .set_tracking_mode(mode)
                .context("Failed to set tracking mode")?;
            println!("Tracking mode {mode} set");
            Ok(())
        }
        Cmd::Cancel => {
            mount.cancel_goto().context("Cancel failed")?;
            println!("Goto cancelled");
            Ok(())
        }
        Cmd::Stop => {
            mount.stop().context("Stop failed")?;
            println!("Stopped");
            Ok(())
        }
        Cmd::Info => info(mount),
        Cmd::Watch { interval_ms, count } => watch(mount, interval_ms, count, reconnect_ms),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();

    let opener = SerialOpener::new(config.serial.clone());
    let mut mount = Mount::with_config(opener, &config.mount);

    run(&mut mount, args.command, config.mount.reconnect_interval_ms)
}
