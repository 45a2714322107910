//! Configuration types for the toasting engine.
//!
//! These are the immutable runtime configuration structs handed to
//! `ToasterCore` at construction. They are separate from the TOML-deserialized
//! config in `toaster_config`; see `conversions` for the bridge.

use std::time::Duration;

use crate::model::{Linear, Saturating};
use crate::power::PowerLevel;

/// Regression curves and estimate clamps.
#[derive(Debug, Clone, Copy)]
pub struct ModelCfg {
    pub full_goldening: Saturating,
    pub full_browning: Linear,
    /// Elapsed seconds at which the full-power goldening curve hands over.
    pub full_goldening_end_s: f64,
    pub baseline_goldening: Saturating,
    pub baseline_browning: Linear,
    /// Reduced power has a single curve with no goldening/browning split.
    pub reduced: Linear,
    /// Substituted for any expected value that cannot be evaluated.
    pub neutral_value: f64,
    pub min_remaining_s: f64,
    pub default_browning_s: f64,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            full_goldening: Saturating::new(43.29, 0.03184, 244.79),
            full_browning: Linear::new(-0.07551, 311.22),
            full_goldening_end_s: 258.15,
            baseline_goldening: Saturating::new(62.32, 0.02597, 139.48),
            baseline_browning: Linear::new(-0.01715, 195.10),
            reduced: Linear::new(-0.01086, 136.70),
            neutral_value: 150.0,
            min_remaining_s: 60.0,
            default_browning_s: 300.0,
        }
    }
}

/// Power adjustment controller calibration.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Deviations with |actual - expected| <= deadband hold baseline power.
    pub deadband: f64,
    /// R units recovered per second at full power.
    pub rate_full: f64,
    /// R units recovered per second at reduced power.
    pub rate_reduced: f64,
    /// Upper bound on any single adjustment period (s).
    pub max_adjustment_s: f64,
    /// Quiet period after returning to baseline (s).
    pub stabilization_s: f64,
    /// Countdown decrement per processed reading (s). Assumes one reading per
    /// loop iteration; keep consistent with `poll_interval` and the sensor rate.
    pub check_interval_s: f64,
    /// Fixed delay between loop iterations.
    pub poll_interval: Duration,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            deadband: 5.0,
            rate_full: 1.10401,
            rate_reduced: 0.55556,
            max_adjustment_s: 10.0,
            stabilization_s: 3.0,
            check_interval_s: 1.0,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// How much browning progress one wall second buys at each power level,
/// relative to baseline.
#[derive(Debug, Clone, Copy)]
pub struct Effectiveness {
    pub full: f64,
    pub baseline: f64,
    pub reduced: f64,
}

impl Effectiveness {
    #[inline]
    pub fn ratio(&self, power: PowerLevel) -> f64 {
        match power {
            PowerLevel::Full => self.full,
            PowerLevel::Baseline => self.baseline,
            PowerLevel::Reduced => self.reduced,
            PowerLevel::Off => 0.0,
        }
    }
}

impl Default for Effectiveness {
    fn default() -> Self {
        Self {
            full: 1.10,
            baseline: 1.00,
            reduced: 0.55,
        }
    }
}

/// Phase transition timing.
#[derive(Debug, Clone, Copy)]
pub struct PhaseCfg {
    /// Baseline-equivalent seconds after which browning starts.
    pub goldening_threshold_s: f64,
    pub effectiveness: Effectiveness,
}

impl Default for PhaseCfg {
    fn default() -> Self {
        Self {
            goldening_threshold_s: 285.0,
            effectiveness: Effectiveness::default(),
        }
    }
}

/// Target counting rule.
#[derive(Debug, Clone, Copy)]
pub struct CompletionCfg {
    pub readings_needed: u32,
    /// Counting may begin this many seconds before the estimated finish.
    pub finish_buffer_s: f64,
}

impl Default for CompletionCfg {
    fn default() -> Self {
        Self {
            readings_needed: 5,
            finish_buffer_s: 60.0,
        }
    }
}

/// Timeouts.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait for a sensor that produces nothing at all, per read (ms).
    /// Exceeding it aborts the run with `ToasterError::Timeout`.
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 10_000 }
    }
}
