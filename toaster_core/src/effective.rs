//! Baseline-equivalent heating time.
//!
//! Wall seconds spent at each power level are weighted by that level's
//! effectiveness relative to baseline and summed. The result drives the phase
//! transition only; the per-reading model is evaluated on raw elapsed time.

use crate::config::Effectiveness;
use crate::power::PowerLevel;

#[derive(Debug, Clone, Default)]
pub struct EffectiveClock {
    total_s: f64,
    checkpoint_s: Option<f64>,
}

impl EffectiveClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated baseline-equivalent seconds.
    #[inline]
    pub fn total(&self) -> f64 {
        self.total_s
    }

    #[inline]
    pub fn checkpoint(&self) -> Option<f64> {
        self.checkpoint_s
    }

    /// Credit the time since the last checkpoint at `power` and move the
    /// checkpoint to `now_s`. The first call only seeds the checkpoint.
    ///
    /// `power` is the level that was active over the interval, i.e. the one
    /// in force before any command issued for this reading.
    pub fn update(&mut self, now_s: f64, power: PowerLevel, ratios: &Effectiveness) -> f64 {
        if let Some(last) = self.checkpoint_s {
            // A clock that steps backwards adds nothing.
            let delta = (now_s - last).max(0.0);
            self.total_s += delta * ratios.ratio(power);
        }
        self.checkpoint_s = Some(now_s);
        self.total_s
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_seeds_without_crediting() {
        let mut c = EffectiveClock::new();
        assert_eq!(c.update(12.0, PowerLevel::Full, &Effectiveness::default()), 0.0);
        assert_eq!(c.checkpoint(), Some(12.0));
    }

    #[test]
    fn weights_by_power() {
        let r = Effectiveness::default();
        let mut c = EffectiveClock::new();
        c.update(0.0, PowerLevel::Baseline, &r);
        c.update(10.0, PowerLevel::Baseline, &r);
        assert!((c.total() - 10.0).abs() < 1e-9);
        c.update(20.0, PowerLevel::Full, &r);
        assert!((c.total() - 21.0).abs() < 1e-9);
        c.update(30.0, PowerLevel::Reduced, &r);
        assert!((c.total() - 26.5).abs() < 1e-9);
        c.update(40.0, PowerLevel::Off, &r);
        assert!((c.total() - 26.5).abs() < 1e-9);
    }

    #[test]
    fn backwards_clock_is_ignored() {
        let r = Effectiveness::default();
        let mut c = EffectiveClock::new();
        c.update(5.0, PowerLevel::Baseline, &r);
        c.update(3.0, PowerLevel::Baseline, &r);
        assert_eq!(c.total(), 0.0);
        assert_eq!(c.checkpoint(), Some(3.0));
    }
}
