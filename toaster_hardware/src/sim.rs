//! Simulated toaster: a heater and a color sensor sharing one oven.
//!
//! Browning progresses in baseline-equivalent seconds, credited at the
//! effectiveness of whatever power was on since the last credit. The sensor
//! replays a caller-supplied profile of R against that effective time.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use toaster_traits::{Clock, ColorSample, ColorSensor, Heater, Lab};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// R as a function of baseline-equivalent seconds.
pub type Profile = Box<dyn Fn(f64) -> f64>;
/// Browning rate of a power percentage relative to baseline.
pub type PowerRatio = Box<dyn Fn(u8) -> f64>;

#[derive(Debug, Clone)]
pub struct SimParams {
    pub sample_period: Duration,
    /// Added to every R reading; positive reads lighter than the profile.
    pub bias: f64,
    /// Fail the read after this many samples with a closed-port error.
    pub fail_after: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(900),
            bias: 0.0,
            fail_after: None,
        }
    }
}

struct Oven {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    effectiveness: PowerRatio,
    power: u8,
    effective_s: f64,
    credited_at: f64,
}

impl Oven {
    fn credit(&mut self) -> f64 {
        let now = self.clock.secs_since(self.epoch);
        let dt = (now - self.credited_at).max(0.0);
        self.effective_s += dt * (self.effectiveness)(self.power);
        self.credited_at = now;
        self.effective_s
    }
}

/// Handle used to build the device pair and inspect the oven afterwards.
#[derive(Clone)]
pub struct SimToaster {
    oven: Rc<RefCell<Oven>>,
}

impl SimToaster {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, effectiveness: PowerRatio) -> Self {
        let epoch = clock.now();
        Self {
            oven: Rc::new(RefCell::new(Oven {
                clock,
                epoch,
                effectiveness,
                power: 0,
                effective_s: 0.0,
                credited_at: 0.0,
            })),
        }
    }

    pub fn devices(
        &self,
        profile: Profile,
        params: SimParams,
    ) -> (SimulatedSensor, SimulatedHeater) {
        (
            SimulatedSensor {
                oven: self.oven.clone(),
                profile,
                params,
                reads: 0,
            },
            SimulatedHeater {
                oven: self.oven.clone(),
            },
        )
    }

    pub fn power(&self) -> u8 {
        self.oven.borrow().power
    }

    pub fn effective_time(&self) -> f64 {
        self.oven.borrow_mut().credit()
    }
}

pub struct SimulatedSensor {
    oven: Rc<RefCell<Oven>>,
    profile: Profile,
    params: SimParams,
    reads: u64,
}

impl ColorSensor for SimulatedSensor {
    fn read(&mut self, timeout: Duration) -> Result<Option<ColorSample>, BoxError> {
        let clock = self.oven.borrow().clock.clone();
        if self.params.sample_period > timeout {
            clock.sleep(timeout);
            return Err(HwError::Timeout.into());
        }
        clock.sleep(self.params.sample_period);
        self.reads += 1;
        if self.params.fail_after.is_some_and(|n| self.reads > n) {
            return Err(HwError::Closed.into());
        }
        let effective = self.oven.borrow_mut().credit();
        let r = ((self.profile)(effective) + self.params.bias).round().max(0.0);
        Ok(Some(sample_for(r)))
    }
}

// Green and blue track red loosely, which is enough for the record columns.
fn sample_for(r: f64) -> ColorSample {
    let red = r as u32;
    let green = (r * 0.72).round() as u32;
    let blue = (r * 0.55).round() as u32;
    ColorSample {
        ambient: red + green + blue,
        red,
        green,
        blue,
        lab: Lab {
            l: (r / 3.0) as f32,
            a: 12.0,
            b: 24.0,
        },
    }
}

pub struct SimulatedHeater {
    oven: Rc<RefCell<Oven>>,
}

impl Heater for SimulatedHeater {
    fn set_power(&mut self, percent: u8) -> Result<(), BoxError> {
        let mut oven = self.oven.borrow_mut();
        oven.credit();
        oven.power = percent;
        tracing::debug!(percent, "simulated heater set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toaster_traits::ManualClock;

    fn ratio(p: u8) -> f64 {
        match p {
            100 => 1.1,
            80 => 1.0,
            60 => 0.55,
            _ => 0.0,
        }
    }

    #[test]
    fn effective_time_is_credited_at_the_previous_power() {
        let clock = ManualClock::new();
        let sim = SimToaster::new(Arc::new(clock.clone()), Box::new(ratio));
        let (_s, mut h) = sim.devices(Box::new(|_: f64| 0.0), SimParams::default());

        clock.advance(Duration::from_secs(5));
        h.set_power(80).unwrap();
        clock.advance(Duration::from_secs(10));
        h.set_power(100).unwrap();
        clock.advance(Duration::from_secs(10));
        h.set_power(60).unwrap();
        clock.advance(Duration::from_secs(10));

        assert!((sim.effective_time() - (10.0 + 11.0 + 5.5)).abs() < 1e-9);
        assert_eq!(sim.power(), 60);
    }

    #[test]
    fn sensor_replays_profile_with_bias_and_fails_on_demand() {
        let clock = ManualClock::new();
        let sim = SimToaster::new(Arc::new(clock.clone()), Box::new(ratio));
        let params = SimParams {
            sample_period: Duration::from_secs(1),
            bias: 2.0,
            fail_after: Some(2),
        };
        let (mut s, mut h) = sim.devices(Box::new(|t: f64| 100.0 + t), params);
        h.set_power(80).unwrap();

        let wait = Duration::from_secs(5);
        let a = s.read(wait).unwrap().unwrap();
        assert_eq!(a.red, 103);
        let b = s.read(wait).unwrap().unwrap();
        assert_eq!(b.red, 104);
        let err = s.read(wait).unwrap_err();
        assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Closed)));
    }

    #[test]
    fn sample_period_longer_than_the_timeout_times_out() {
        let clock = ManualClock::new();
        let sim = SimToaster::new(Arc::new(clock.clone()), Box::new(ratio));
        let (mut s, _h) = sim.devices(Box::new(|_: f64| 150.0), SimParams::default());

        let start = clock.now();
        let err = s.read(Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Timeout)));
        assert_eq!(clock.now() - start, Duration::from_millis(500));
    }
}
