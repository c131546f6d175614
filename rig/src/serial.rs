//! Serial transport for the IMU line stream

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use serialport::{SerialPort, SerialPortInfo};

/// Non-blocking serial adapter feeding the control loop.
///
/// The port timeout is zero so a read never stalls the loop; the loop
/// checks `bytes_available` first and only reads what the driver already
/// buffered.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        info!("Opening serial port: {path} at {baud} bps");
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(0))
            .open()
            .with_context(|| format!("Failed to open serial port {path}"))?;
        Ok(Self { port })
    }
}

impl stabilizer::ByteSource for SerialSource {
    fn bytes_available(&mut self) -> Result<usize> {
        let n = self
            .port
            .bytes_to_read()
            .context("Failed to query serial input buffer")?;
        Ok(n as usize)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e).context("Failed to read from serial port"),
        }
    }
}

/// Serial ports present on this machine.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    serialport::available_ports().context("Failed to enumerate serial ports")
}
