//! Power adjustment controller.
//!
//! A single discriminated mode decides what each reading is allowed to do:
//!
//! - `Normal`: heater at baseline; the reading is compared to the model and
//!   may start an adjustment.
//! - `Adjusting`: heater at full or reduced power for a bounded period; the
//!   reading only advances the countdown. Expiry returns to baseline and arms
//!   stabilization.
//! - `Stabilizing`: heater back at baseline but readings still lag the power
//!   change; the reading only advances the countdown.
//!
//! Countdowns advance by `check_interval_s` per reading, not by measured time.

use std::fmt;

use crate::config::ControlCfg;
use crate::power::PowerLevel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMode {
    Normal,
    Adjusting { power: PowerLevel, time_left_s: f64 },
    Stabilizing { time_left_s: f64 },
}

/// What the controller did with one reading. `Display` gives the
/// human-readable action column of the run log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    OnTrack,
    Increase { duration_s: f64 },
    Decrease { duration_s: f64 },
    CompletingAdjustment,
    Stabilizing,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTrack => write!(f, "On track, maintaining {} power", PowerLevel::Baseline),
            Self::Increase { duration_s } => {
                write!(f, "Increasing power to {} for {duration_s:.2}s", PowerLevel::Full)
            }
            Self::Decrease { duration_s } => {
                write!(f, "Decreasing power to {} for {duration_s:.2}s", PowerLevel::Reduced)
            }
            Self::CompletingAdjustment => f.write_str("Completing power adjustment period"),
            Self::Stabilizing => f.write_str("Waiting for sensor readings to stabilize"),
        }
    }
}

/// Outcome of one evaluation: the action taken and the heater command to
/// issue, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub command: Option<PowerLevel>,
}

#[derive(Debug, Clone)]
pub struct PowerController {
    cfg: ControlCfg,
    mode: ControlMode,
}

impl PowerController {
    pub fn new(cfg: ControlCfg) -> Self {
        Self {
            cfg,
            mode: ControlMode::Normal,
        }
    }

    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Power level currently in force.
    #[inline]
    pub fn power(&self) -> PowerLevel {
        match self.mode {
            ControlMode::Adjusting { power, .. } => power,
            ControlMode::Normal | ControlMode::Stabilizing { .. } => PowerLevel::Baseline,
        }
    }

    /// Baseline power and not stabilizing.
    #[inline]
    pub fn valid_for_control(&self) -> bool {
        matches!(self.mode, ControlMode::Normal)
    }

    pub fn cfg(&self) -> &ControlCfg {
        &self.cfg
    }

    /// Seconds to hold `to` in order to make up `difference` R units, capped
    /// at `max_adjustment_s`.
    pub fn adjustment_time(&self, difference: f64, to: PowerLevel) -> f64 {
        let rate = match to {
            PowerLevel::Full => self.cfg.rate_full,
            _ => self.cfg.rate_reduced,
        };
        (difference.abs() / rate).min(self.cfg.max_adjustment_s)
    }

    /// Process one reading against its expected value.
    pub fn evaluate(&mut self, actual: f64, expected: f64) -> Decision {
        let tick = self.cfg.check_interval_s;
        match self.mode {
            ControlMode::Stabilizing { time_left_s } => {
                let left = time_left_s - tick;
                if left <= 0.0 {
                    tracing::info!("stabilization complete, resuming normal control");
                    self.mode = ControlMode::Normal;
                } else {
                    tracing::debug!(time_left_s = left, "stabilizing; reading not used for control");
                    self.mode = ControlMode::Stabilizing { time_left_s: left };
                }
                Decision {
                    action: Action::Stabilizing,
                    command: None,
                }
            }
            ControlMode::Adjusting { power, time_left_s } => {
                let left = time_left_s - tick;
                if left <= 0.0 {
                    tracing::info!(
                        stabilization_s = self.cfg.stabilization_s,
                        "adjustment complete, returning to baseline power"
                    );
                    self.mode = ControlMode::Stabilizing {
                        time_left_s: self.cfg.stabilization_s,
                    };
                    Decision {
                        action: Action::CompletingAdjustment,
                        command: Some(PowerLevel::Baseline),
                    }
                } else {
                    tracing::debug!(%power, time_left_s = left, "adjusting; reading not used for control");
                    self.mode = ControlMode::Adjusting {
                        power,
                        time_left_s: left,
                    };
                    Decision {
                        action: Action::CompletingAdjustment,
                        command: None,
                    }
                }
            }
            ControlMode::Normal => {
                let difference = actual - expected;
                if difference < -self.cfg.deadband {
                    // Reading is behind the model: more heat.
                    let duration_s = self.adjustment_time(difference, PowerLevel::Full);
                    tracing::info!(
                        behind_by = -difference,
                        duration_s,
                        max_adjustment_s = self.cfg.max_adjustment_s,
                        "power adjustment: increasing to full"
                    );
                    self.mode = ControlMode::Adjusting {
                        power: PowerLevel::Full,
                        time_left_s: duration_s,
                    };
                    Decision {
                        action: Action::Increase { duration_s },
                        command: Some(PowerLevel::Full),
                    }
                } else if difference > self.cfg.deadband {
                    // Ahead of the model: less heat.
                    let duration_s = self.adjustment_time(difference, PowerLevel::Reduced);
                    tracing::info!(
                        ahead_by = difference,
                        duration_s,
                        max_adjustment_s = self.cfg.max_adjustment_s,
                        "power adjustment: decreasing to reduced"
                    );
                    self.mode = ControlMode::Adjusting {
                        power: PowerLevel::Reduced,
                        time_left_s: duration_s,
                    };
                    Decision {
                        action: Action::Decrease { duration_s },
                        command: Some(PowerLevel::Reduced),
                    }
                } else {
                    Decision {
                        action: Action::OnTrack,
                        command: None,
                    }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.mode = ControlMode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PowerController {
        PowerController::new(ControlCfg::default())
    }

    #[test]
    fn action_strings_match_run_log_wording() {
        assert_eq!(Action::OnTrack.to_string(), "On track, maintaining 80% power");
        assert_eq!(
            Action::Increase { duration_s: 7.246_311 }.to_string(),
            "Increasing power to 100% for 7.25s"
        );
        assert_eq!(
            Action::Decrease { duration_s: 10.0 }.to_string(),
            "Decreasing power to 60% for 10.00s"
        );
        assert_eq!(
            Action::CompletingAdjustment.to_string(),
            "Completing power adjustment period"
        );
        assert_eq!(
            Action::Stabilizing.to_string(),
            "Waiting for sensor readings to stabilize"
        );
    }

    #[test]
    fn deadband_edges_hold_baseline() {
        let mut c = controller();
        for d in [-5.0, 0.0, 5.0] {
            let dec = c.evaluate(150.0 + d, 150.0);
            assert_eq!(dec.command, None);
            assert_eq!(c.mode(), ControlMode::Normal);
        }
    }

    #[test]
    fn ahead_throttles_to_reduced() {
        let mut c = controller();
        let dec = c.evaluate(160.0, 150.0);
        assert_eq!(dec.command, Some(PowerLevel::Reduced));
        assert_eq!(c.power(), PowerLevel::Reduced);
        // 10 / 0.55556 = 18.0 → capped
        match c.mode() {
            ControlMode::Adjusting { time_left_s, .. } => assert_eq!(time_left_s, 10.0),
            other => panic!("unexpected mode {other:?}"),
        }
        assert!(!c.valid_for_control());
    }

    #[test]
    fn adjusting_ignores_readings_until_expiry() {
        let mut c = controller();
        c.evaluate(144.0, 150.0); // -6 → 5.43s at full
        for _ in 0..5 {
            let dec = c.evaluate(0.0, 150.0);
            assert_eq!(dec.command, None);
            assert_eq!(c.power(), PowerLevel::Full);
        }
        let dec = c.evaluate(0.0, 150.0);
        assert_eq!(dec.command, Some(PowerLevel::Baseline));
        assert_eq!(c.mode(), ControlMode::Stabilizing { time_left_s: 3.0 });
    }

    #[test]
    fn stabilization_runs_three_ticks() {
        let mut c = controller();
        c.evaluate(144.0, 150.0);
        while !matches!(c.mode(), ControlMode::Stabilizing { .. }) {
            c.evaluate(150.0, 150.0);
        }
        assert_eq!(c.power(), PowerLevel::Baseline);
        // Large deviations are ignored while stabilizing.
        assert_eq!(c.evaluate(100.0, 150.0).action, Action::Stabilizing);
        assert_eq!(c.evaluate(100.0, 150.0).action, Action::Stabilizing);
        assert!(!c.valid_for_control());
        assert_eq!(c.evaluate(100.0, 150.0).action, Action::Stabilizing);
        assert!(c.valid_for_control());
        // Next reading is a real decision again.
        assert_eq!(c.evaluate(100.0, 150.0).command, Some(PowerLevel::Full));
    }
}
