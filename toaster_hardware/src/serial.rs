//! Sensor and heater over any byte stream speaking the line protocol.

use std::io::{BufRead, ErrorKind, Write};
use std::time::{Duration, Instant};

use toaster_traits::{ColorSample, ColorSensor, Heater};

use crate::error::{HwError, Result};
use crate::line::{is_channels_line, parse_channels, parse_lab};

/// Outcome of one attempt at reading a line.
enum Line {
    Text(String),
    /// Nothing complete yet: transport timeout or a partial line.
    Idle,
    /// Bytes that are not UTF-8; the cycle is skipped.
    Garbled,
}

/// Reads coupled channel/Lab line pairs from `R`.
///
/// Single reads are bounded by the transport (the port timeout on a serial
/// line). A read that stays idle past the timeout handed to
/// [`ColorSensor::read`] fails with [`HwError::Timeout`]. A zero-byte read
/// counts as idle when `eof_is_timeout` is set and as a closed port otherwise.
pub struct SerialSensor<R: BufRead> {
    reader: R,
    eof_is_timeout: bool,
    pending: String,
}

impl<R: BufRead> SerialSensor<R> {
    /// Sensor over a finite stream (file, pipe, test buffer). End of input is
    /// a closed port.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            eof_is_timeout: false,
            pending: String::new(),
        }
    }

    /// Sensor over a port configured with a read timeout.
    pub fn with_timeouts(reader: R) -> Self {
        Self {
            eof_is_timeout: true,
            ..Self::new(reader)
        }
    }

    fn next_line(&mut self) -> Result<Line> {
        match self.reader.read_line(&mut self.pending) {
            Ok(0) if self.pending.is_empty() => {
                if self.eof_is_timeout {
                    Ok(Line::Idle)
                } else {
                    Err(HwError::Closed)
                }
            }
            // Partial lines are kept until their newline arrives.
            Ok(_) if !self.pending.ends_with('\n') && self.eof_is_timeout => Ok(Line::Idle),
            Ok(_) => {
                let line = self.pending.trim().to_owned();
                self.pending.clear();
                Ok(Line::Text(line))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(Line::Idle)
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                tracing::trace!("dropping undecodable bytes");
                self.pending.clear();
                Ok(Line::Garbled)
            }
            Err(e) => Err(HwError::Io(e)),
        }
    }

    /// Next complete line, `Ok(None)` for undecodable bytes.
    fn await_line(&mut self, deadline: Instant) -> Result<Option<String>> {
        loop {
            match self.next_line()? {
                Line::Text(line) => return Ok(Some(line)),
                Line::Garbled => return Ok(None),
                Line::Idle if Instant::now() >= deadline => return Err(HwError::Timeout),
                Line::Idle => {}
            }
        }
    }

    fn read_sample(&mut self, timeout: Duration) -> Result<Option<ColorSample>> {
        let deadline = Instant::now() + timeout;
        let Some(first) = self.await_line(deadline)? else {
            return Ok(None);
        };
        if !is_channels_line(&first) {
            tracing::trace!(line = %first, "skipping non-reading line");
            return Ok(None);
        }
        let Some(channels) = parse_channels(&first) else {
            tracing::trace!(line = %first, "skipping malformed channel line");
            return Ok(None);
        };
        // The board is alive; a missing Lab line only costs this cycle.
        let second = match self.await_line(deadline) {
            Ok(Some(line)) => line,
            Ok(None) | Err(HwError::Timeout) => {
                tracing::trace!("channel line without lab line");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match parse_lab(&second) {
            Some(lab) => Ok(Some(channels.with_lab(lab))),
            None => {
                tracing::trace!(line = %second, "skipping unpaired channel line");
                Ok(None)
            }
        }
    }
}

impl<R: BufRead> ColorSensor for SerialSensor<R> {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<Option<ColorSample>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_sample(timeout)?)
    }
}

/// Writes power commands as `"<percent>\n"`.
pub struct SerialHeater<W: Write> {
    writer: W,
}

impl<W: Write> SerialHeater<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn command(&mut self, percent: u8) -> Result<()> {
        writeln!(self.writer, "{percent}")?;
        self.writer.flush()?;
        tracing::debug!(percent, "power command sent");
        Ok(())
    }
}

impl<W: Write> Heater for SerialHeater<W> {
    fn set_power(
        &mut self,
        percent: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.command(percent)?)
    }

    fn close(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writer.flush().map_err(HwError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn heater_writes_newline_terminated_percent() {
        let mut h = SerialHeater::new(Vec::new());
        h.set_power(80).unwrap();
        h.off().unwrap();
        assert_eq!(h.into_inner(), b"80\n0\n");
    }

    #[test]
    fn partial_line_is_kept_until_the_sensor_times_out() {
        let mut s = SerialSensor::with_timeouts(Cursor::new(b"Ambient: 1 Red".to_vec()));
        let err = s.read_sample(Duration::ZERO).unwrap_err();
        assert!(matches!(err, HwError::Timeout));
        assert_eq!(s.pending, "Ambient: 1 Red");
    }

    #[test]
    fn idle_port_waits_for_the_timeout() {
        let mut s = SerialSensor::with_timeouts(Cursor::new(Vec::new()));
        let start = Instant::now();
        let err = s.read_sample(Duration::from_millis(30)).unwrap_err();
        assert!(matches!(err, HwError::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn missing_lab_line_skips_instead_of_timing_out() {
        let line = b"Ambient: 1 Red: 2 Green: 3 Blue: 4\n".to_vec();
        let mut s = SerialSensor::with_timeouts(Cursor::new(line));
        assert!(s.read_sample(Duration::ZERO).unwrap().is_none());
    }
}
