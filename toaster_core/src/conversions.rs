//! `From` implementations bridging `toaster_config` types to `toaster_core` types.
//!
//! The CLI hands config sections straight to these; no field mapping happens
//! outside this module.

use std::time::Duration;

use crate::config::{CompletionCfg, ControlCfg, Effectiveness, ModelCfg, PhaseCfg, Timeouts};
use crate::model::{Linear, Saturating};

impl From<&toaster_config::SaturatingCurve> for Saturating {
    fn from(c: &toaster_config::SaturatingCurve) -> Self {
        Self::new(c.amplitude, c.rate, c.offset)
    }
}

impl From<&toaster_config::LinearCurve> for Linear {
    fn from(c: &toaster_config::LinearCurve) -> Self {
        Self::new(c.slope, c.intercept)
    }
}

// ── ModelCfg ─────────────────────────────────────────────────────────────────

impl From<&toaster_config::ModelCfg> for ModelCfg {
    fn from(c: &toaster_config::ModelCfg) -> Self {
        Self {
            full_goldening: (&c.full.goldening).into(),
            full_browning: (&c.full.browning).into(),
            full_goldening_end_s: c.full.goldening_end_s,
            baseline_goldening: (&c.baseline.goldening).into(),
            baseline_browning: (&c.baseline.browning).into(),
            reduced: (&c.reduced.linear).into(),
            neutral_value: c.neutral_value,
            min_remaining_s: c.min_remaining_s,
            default_browning_s: c.default_browning_s,
        }
    }
}

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&toaster_config::ControlCfg> for ControlCfg {
    fn from(c: &toaster_config::ControlCfg) -> Self {
        Self {
            deadband: c.deadband,
            rate_full: c.rate_full,
            rate_reduced: c.rate_reduced,
            max_adjustment_s: c.max_adjustment_s,
            stabilization_s: c.stabilization_s,
            check_interval_s: c.check_interval_s,
            poll_interval: Duration::from_millis(c.poll_interval_ms),
        }
    }
}

// ── PhaseCfg ─────────────────────────────────────────────────────────────────

impl From<&toaster_config::Effectiveness> for Effectiveness {
    fn from(c: &toaster_config::Effectiveness) -> Self {
        Self {
            full: c.full,
            baseline: c.baseline,
            reduced: c.reduced,
        }
    }
}

impl From<&toaster_config::PhaseCfg> for PhaseCfg {
    fn from(c: &toaster_config::PhaseCfg) -> Self {
        Self {
            goldening_threshold_s: c.goldening_threshold_s,
            effectiveness: (&c.effectiveness).into(),
        }
    }
}

// ── CompletionCfg ────────────────────────────────────────────────────────────

impl From<&toaster_config::CompletionCfg> for CompletionCfg {
    fn from(c: &toaster_config::CompletionCfg) -> Self {
        Self {
            readings_needed: c.readings_needed,
            finish_buffer_s: c.finish_buffer_s,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&toaster_config::Serial> for Timeouts {
    fn from(c: &toaster_config::Serial) -> Self {
        Self {
            sensor_ms: c.sensor_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_runtime_structs() {
        let cfg = toaster_config::Config::default();
        let model = ModelCfg::from(&cfg.model);
        let want = ModelCfg::default();
        assert_eq!(model.full_goldening, want.full_goldening);
        assert_eq!(model.baseline_browning, want.baseline_browning);
        assert_eq!(model.reduced, want.reduced);
        assert_eq!(model.full_goldening_end_s, want.full_goldening_end_s);

        let control = ControlCfg::from(&cfg.control);
        assert_eq!(control.poll_interval, Duration::from_millis(100));
        assert_eq!(control.rate_full, ControlCfg::default().rate_full);

        let phase = PhaseCfg::from(&cfg.phase);
        assert_eq!(phase.goldening_threshold_s, 285.0);
        assert_eq!(phase.effectiveness.reduced, 0.55);

        assert_eq!(CompletionCfg::from(&cfg.completion).readings_needed, 5);
        assert_eq!(Timeouts::from(&cfg.serial).sensor_ms, 10_000);
    }
}
