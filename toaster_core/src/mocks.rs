//! Test and helper mocks for toaster_core

use toaster_traits::{ColorSample, ColorSensor, Heater};

/// A sensor that never yields a reading; useful when driving the control
/// loop with externally obtained samples via `step_from_sample`.
pub struct NoopSensor;

impl ColorSensor for NoopSensor {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<Option<ColorSample>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

/// A heater that accepts every command.
pub struct NoopHeater;

impl Heater for NoopHeater {
    fn set_power(&mut self, _percent: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
