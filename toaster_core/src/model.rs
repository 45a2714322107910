//! Browning model: expected R channel value as a function of heating time.
//!
//! Each power level is characterized by regression curves fitted offline.
//! Full and baseline power split into a saturating goldening curve followed by
//! a linear browning curve; reduced power is a single line. Curve selection
//! depends on the current phase and power; in browning the time axis is
//! re-based on the phase transition so the browning curves continue from
//! where goldening ended.

use crate::config::ModelCfg;
use crate::phase::Phase;
use crate::power::PowerLevel;

/// `amplitude * (1 - exp(-rate * t)) + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturating {
    pub amplitude: f64,
    pub rate: f64,
    pub offset: f64,
}

impl Saturating {
    pub const fn new(amplitude: f64, rate: f64, offset: f64) -> Self {
        Self {
            amplitude,
            rate,
            offset,
        }
    }

    /// `None` when the result is not a finite number.
    #[inline]
    pub fn eval(&self, t: f64) -> Option<f64> {
        let v = self.amplitude * (1.0 - (-self.rate * t).exp()) + self.offset;
        v.is_finite().then_some(v)
    }
}

/// `slope * t + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    pub slope: f64,
    pub intercept: f64,
}

impl Linear {
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    #[inline]
    pub fn eval(&self, t: f64) -> Option<f64> {
        let v = self.slope * t + self.intercept;
        v.is_finite().then_some(v)
    }

    /// Time at which the line reaches `value`.
    #[inline]
    pub fn solve(&self, value: f64) -> Option<f64> {
        let t = (value - self.intercept) / self.slope;
        t.is_finite().then_some(t)
    }
}

/// Remaining-time projection for the two phases, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseEstimate {
    pub remaining_goldening_s: f64,
    pub remaining_browning_s: f64,
}

impl PhaseEstimate {
    pub fn total(&self) -> f64 {
        self.remaining_goldening_s + self.remaining_browning_s
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    cfg: ModelCfg,
    goldening_threshold_s: f64,
}

impl Model {
    pub fn new(cfg: ModelCfg, goldening_threshold_s: f64) -> Self {
        Self {
            cfg,
            goldening_threshold_s,
        }
    }

    pub fn cfg(&self) -> &ModelCfg {
        &self.cfg
    }

    /// Expected R at `elapsed_s`, or `None` if the selected curve cannot be
    /// evaluated (non-finite result, browning without a transition time).
    pub fn try_expected(
        &self,
        phase: Phase,
        power: PowerLevel,
        elapsed_s: f64,
        transition_s: Option<f64>,
    ) -> Option<f64> {
        let c = &self.cfg;
        let threshold = self.goldening_threshold_s;
        match (phase, power) {
            (_, PowerLevel::Off) => None,
            (Phase::Goldening, PowerLevel::Full) => {
                if elapsed_s <= c.full_goldening_end_s {
                    c.full_goldening.eval(elapsed_s)
                } else {
                    c.full_browning.eval(elapsed_s)
                }
            }
            // Reduced has no goldening split and follows the baseline pair here.
            (Phase::Goldening, PowerLevel::Baseline | PowerLevel::Reduced) => {
                if elapsed_s <= threshold {
                    c.baseline_goldening.eval(elapsed_s)
                } else {
                    c.baseline_browning.eval(elapsed_s)
                }
            }
            (Phase::Browning, PowerLevel::Full) => {
                let since = elapsed_s - transition_s?;
                c.full_browning.eval(since + c.full_goldening_end_s)
            }
            (Phase::Browning, PowerLevel::Baseline) => {
                let since = elapsed_s - transition_s?;
                c.baseline_browning.eval(threshold + since)
            }
            (Phase::Browning, PowerLevel::Reduced) => c.reduced.eval(elapsed_s),
        }
    }

    /// Expected R at `elapsed_s`; evaluation failures yield the neutral value
    /// so the control loop never halts on a model error.
    pub fn expected(
        &self,
        phase: Phase,
        power: PowerLevel,
        elapsed_s: f64,
        transition_s: Option<f64>,
    ) -> f64 {
        self.try_expected(phase, power, elapsed_s, transition_s)
            .unwrap_or_else(|| {
                tracing::warn!(
                    ?phase,
                    %power,
                    elapsed_s,
                    neutral = self.cfg.neutral_value,
                    "expected R unavailable, substituting neutral value"
                );
                self.cfg.neutral_value
            })
    }

    /// Seconds of baseline browning left until R falls to `value`, never
    /// below `min_remaining_s`.
    pub fn remaining_time(&self, value: f64) -> f64 {
        let line = &self.cfg.baseline_browning;
        // Solve intercept + slope * t = value for t, measured from t = 0.
        match line.solve(value) {
            Some(t) => t.max(self.cfg.min_remaining_s),
            None => self.cfg.min_remaining_s,
        }
    }

    /// Baseline R expected when goldening ends.
    pub fn transition_value(&self) -> Option<f64> {
        self.cfg
            .baseline_goldening
            .eval(self.goldening_threshold_s)
    }

    /// Baseline trajectory as a function of baseline-equivalent time. This is
    /// what an on-model slice of bread reads, and what the simulator replays.
    pub fn baseline_profile(&self, effective_s: f64) -> f64 {
        let c = &self.cfg;
        let v = if effective_s <= self.goldening_threshold_s {
            c.baseline_goldening.eval(effective_s)
        } else {
            c.baseline_browning.eval(effective_s)
        };
        v.unwrap_or(c.neutral_value)
    }

    /// Whole-run projection made once at loop start: a full goldening phase
    /// followed by browning from the goldening end value.
    pub fn initial_estimate(&self) -> PhaseEstimate {
        let browning = self
            .transition_value()
            .map(|r| self.remaining_time(r))
            .filter(|t| *t >= 0.0)
            .unwrap_or(self.cfg.default_browning_s);
        PhaseEstimate {
            remaining_goldening_s: self.goldening_threshold_s,
            remaining_browning_s: browning,
        }
    }

    /// Per-cycle projection from the current phase, effective time and reading.
    pub fn estimate(&self, phase: Phase, effective_s: f64, current_r: f64) -> PhaseEstimate {
        match phase {
            Phase::Goldening => {
                let remaining_goldening = (self.goldening_threshold_s - effective_s).max(0.0);
                let browning = match self.transition_value() {
                    Some(r) if r <= self.cfg.baseline_browning.intercept => self.remaining_time(r),
                    _ => self.cfg.default_browning_s,
                };
                PhaseEstimate {
                    remaining_goldening_s: remaining_goldening,
                    remaining_browning_s: browning,
                }
            }
            Phase::Browning => PhaseEstimate {
                remaining_goldening_s: 0.0,
                remaining_browning_s: self.remaining_time(current_r),
            },
        }
    }
}
