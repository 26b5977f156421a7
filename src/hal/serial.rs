//! Serial port channel built on the `serialport` crate.
//!
//! Opens the hand controller's RS-232 link at 8N1 with the configured baud
//! rate and read timeout. Reads accumulate until the `#` terminator or the
//! requested byte count. Running into the timeout first is an error, even
//! when some bytes already arrived.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::codec::TERMINATOR;
use crate::config::SerialConfig;
use crate::error::ChannelError;
use crate::traits::{ChannelOpener, MountChannel};

/// Opens [`SerialChannel`]s from a [`SerialConfig`].
#[derive(Clone, Debug, Default)]
pub struct SerialOpener {
    config: SerialConfig,
}

impl SerialOpener {
    /// Create an opener for the given port settings.
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    /// Port settings in use.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ChannelOpener for SerialOpener {
    type Channel = SerialChannel;

    fn open(&mut self) -> Result<SerialChannel, ChannelError> {
        let path = self.config.port.as_str();
        info!("Opening serial port: {path} at {} bps", self.config.baud);

        let port = serialport::new(path, self.config.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(u64::from(self.config.timeout_ms)))
            .open()
            .map_err(|e| ChannelError::OpenFailed(format!("{path}: {e}")))?;

        Ok(SerialChannel { port: Some(port) })
    }

    fn describe(&self) -> String {
        self.config.port.as_str().to_owned()
    }
}

fn timed_out(partial: &[u8]) -> ChannelError {
    if !partial.is_empty() {
        debug!("Timed out after {} bytes: {partial:?}", partial.len());
    }
    ChannelError::Timeout
}

/// An open serial link to the hand controller.
pub struct SerialChannel {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialChannel {
    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ChannelError> {
        self.port
            .as_mut()
            .ok_or_else(|| ChannelError::ReadFailed("port closed".into()))
    }
}

impl MountChannel for SerialChannel {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ChannelError::WriteFailed("port closed".into()))?;
        port.write_all(bytes)
            .and_then(|()| port.flush())
            .map_err(|e| ChannelError::WriteFailed(e.to_string()))
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, ChannelError> {
        let port = self.port()?;
        let mut reply = Vec::with_capacity(max_bytes);
        let mut byte = [0u8; 1];

        while reply.len() < max_bytes {
            match port.read(&mut byte) {
                Ok(0) => return Err(timed_out(&reply)),
                Ok(_) => {
                    reply.push(byte[0]);
                    if byte[0] == TERMINATOR {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(timed_out(&reply))
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChannelError::ReadFailed(e.to_string())),
            }
        }

        debug!("Read {} bytes", reply.len());
        Ok(reply)
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.port()?
            .clear(ClearBuffer::Input)
            .map_err(|e| ChannelError::ReadFailed(e.to_string()))
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        // Dropping the handle releases the device
        self.port.take();
        Ok(())
    }
}
