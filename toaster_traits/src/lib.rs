pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One coupled reading from the color sensor: raw channel counts plus the
/// device-computed L*a*b* triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSample {
    pub ambient: u32,
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub lab: Lab,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

pub trait ColorSensor {
    /// Block for the next reading.
    ///
    /// `Ok(None)` means the source produced something that was not a complete
    /// reading (malformed line, unpaired line, read timeout); the caller skips
    /// the cycle. `Err` is a transport failure.
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<ColorSample>, Box<dyn std::error::Error + Send + Sync>>;

    /// Release the underlying transport. Called once on every exit path.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

pub trait Heater {
    /// Command a power level in percent (0, 60, 80 or 100).
    fn set_power(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set_power(0)
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: ColorSensor + ?Sized> ColorSensor for Box<T> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<ColorSample>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}

impl<T: Heater + ?Sized> Heater for Box<T> {
    fn set_power(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_power(percent)
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).off()
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}
