//! Serial port setup for the sensor board.

use std::io::BufReader;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::{HwError, Result};
use crate::serial::{SerialHeater, SerialSensor};

pub type PortSensor = SerialSensor<BufReader<Box<dyn SerialPort>>>;
pub type PortHeater = SerialHeater<Box<dyn SerialPort>>;

#[derive(Debug, Clone)]
pub struct PortSettings {
    pub baud: u32,
    /// Bound on a single blocking read; an idle line comes back empty.
    pub read_timeout: Duration,
    /// Delay after opening; boards that reset on DTR need it before the
    /// first command is accepted.
    pub settle: Duration,
}

fn setup(e: serialport::Error) -> HwError {
    match e.kind() {
        serialport::ErrorKind::Io(kind) => HwError::Io(std::io::Error::new(kind, e.description)),
        _ => HwError::Setup(e.to_string()),
    }
}

/// Open `path` (`/dev/ttyUSB0`, `COM5`, ...), wait for the board to settle and
/// drop whatever it printed while booting.
pub fn open_serial(path: &str, settings: &PortSettings) -> Result<(PortSensor, PortHeater)> {
    let port = serialport::new(path, settings.baud)
        .timeout(settings.read_timeout)
        .open()
        .map_err(setup)?;
    tracing::info!(port = path, baud = settings.baud, "serial port opened");

    std::thread::sleep(settings.settle);
    port.clear(ClearBuffer::Input).map_err(setup)?;

    let writer = port.try_clone().map_err(setup)?;
    Ok((
        SerialSensor::with_timeouts(BufReader::new(port)),
        SerialHeater::new(writer),
    ))
}
