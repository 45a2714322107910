#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the toaster controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; missing sections take the characterization
//!   defaults, so an empty file is a valid config.
use serde::Deserialize;

/// `amplitude * (1 - exp(-rate * t)) + offset`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SaturatingCurve {
    pub amplitude: f64,
    pub rate: f64,
    pub offset: f64,
}

/// `slope * t + intercept`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LinearCurve {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FullModel {
    pub goldening: SaturatingCurve,
    pub browning: LinearCurve,
    /// Elapsed seconds at which the full-power goldening curve hands over to browning.
    pub goldening_end_s: f64,
}

impl Default for FullModel {
    fn default() -> Self {
        Self {
            goldening: SaturatingCurve {
                amplitude: 43.29,
                rate: 0.03184,
                offset: 244.79,
            },
            browning: LinearCurve {
                slope: -0.07551,
                intercept: 311.22,
            },
            goldening_end_s: 258.15,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct BaselineModel {
    pub goldening: SaturatingCurve,
    pub browning: LinearCurve,
}

impl Default for BaselineModel {
    fn default() -> Self {
        Self {
            goldening: SaturatingCurve {
                amplitude: 62.32,
                rate: 0.02597,
                offset: 139.48,
            },
            browning: LinearCurve {
                slope: -0.01715,
                intercept: 195.10,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ReducedModel {
    pub linear: LinearCurve,
}

impl Default for ReducedModel {
    fn default() -> Self {
        Self {
            linear: LinearCurve {
                slope: -0.01086,
                intercept: 136.70,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ModelCfg {
    pub full: FullModel,
    pub baseline: BaselineModel,
    pub reduced: ReducedModel,
    /// Expected R substituted when a curve cannot be evaluated.
    pub neutral_value: f64,
    /// Lower clamp for remaining-time estimates (s).
    pub min_remaining_s: f64,
    /// Browning time assumed when the goldening end value sits above the browning intercept (s).
    pub default_browning_s: f64,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            full: FullModel::default(),
            baseline: BaselineModel::default(),
            reduced: ReducedModel::default(),
            neutral_value: 150.0,
            min_remaining_s: 60.0,
            default_browning_s: 300.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Device path of the sensor/relay board (e.g. /dev/ttyUSB0)
    pub port: String,
    pub baud: u32,
    /// Max wait for one line before the cycle is skipped (ms)
    pub read_timeout_ms: u64,
    /// Max wait for any line at all before the sensor counts as lost (ms)
    pub sensor_timeout_ms: u64,
    /// Delay after opening the port while the board resets (ms)
    pub settle_ms: u64,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: 9600,
            read_timeout_ms: 1000,
            sensor_timeout_ms: 10_000,
            settle_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// |actual - expected| at or below this holds baseline power
    pub deadband: f64,
    /// R units recovered per second at full power
    pub rate_full: f64,
    /// R units recovered per second at reduced power
    pub rate_reduced: f64,
    pub max_adjustment_s: f64,
    pub stabilization_s: f64,
    /// Countdown decrement applied per processed reading (s)
    pub check_interval_s: f64,
    /// Fixed delay between loop iterations (ms)
    pub poll_interval_ms: u64,
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
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Effectiveness {
    pub full: f64,
    pub baseline: f64,
    pub reduced: f64,
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PhaseCfg {
    /// Baseline-equivalent seconds of goldening before browning starts
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CompletionCfg {
    /// Non-consecutive readings at/below target required to stop
    pub readings_needed: u32,
    /// Counting opens this many seconds before the estimated finish
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordCfg {
    /// CSV log of every processed reading
    pub path: String,
}

impl Default for RecordCfg {
    fn default() -> Self {
        Self {
            path: "toaster_control_log.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Time one simulated sensor read takes (ms); with the poll delay this sets the cycle length
    pub sample_period_ms: u64,
    /// Constant offset added to the simulated R channel
    pub bias: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            sample_period_ms: 900,
            bias: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub serial: Serial,
    pub model: ModelCfg,
    pub control: ControlCfg,
    pub phase: PhaseCfg,
    pub completion: CompletionCfg,
    pub record: RecordCfg,
    pub logging: Logging,
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn finite(v: f64) -> bool {
    v.is_finite()
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.port.trim().is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.read_timeout_ms == 0 {
            eyre::bail!("serial.read_timeout_ms must be >= 1");
        }
        if self.serial.sensor_timeout_ms < self.serial.read_timeout_ms {
            eyre::bail!("serial.sensor_timeout_ms must be >= serial.read_timeout_ms");
        }
        if self.serial.settle_ms > 60_000 {
            eyre::bail!("serial.settle_ms is unreasonably large (>60s)");
        }

        // Model
        let m = &self.model;
        let curves_finite = [
            m.full.goldening.amplitude,
            m.full.goldening.rate,
            m.full.goldening.offset,
            m.full.browning.slope,
            m.full.browning.intercept,
            m.baseline.goldening.amplitude,
            m.baseline.goldening.rate,
            m.baseline.goldening.offset,
            m.baseline.browning.slope,
            m.baseline.browning.intercept,
            m.reduced.linear.slope,
            m.reduced.linear.intercept,
        ]
        .into_iter()
        .all(finite);
        if !curves_finite {
            eyre::bail!("model curve coefficients must be finite");
        }
        if m.baseline.browning.slope == 0.0 {
            eyre::bail!("model.baseline.browning.slope must be non-zero");
        }
        if !(m.full.goldening_end_s.is_finite() && m.full.goldening_end_s > 0.0) {
            eyre::bail!("model.full.goldening_end_s must be > 0");
        }
        if !m.neutral_value.is_finite() {
            eyre::bail!("model.neutral_value must be finite");
        }
        if !(m.min_remaining_s.is_finite() && m.min_remaining_s >= 0.0) {
            eyre::bail!("model.min_remaining_s must be >= 0");
        }
        if !(m.default_browning_s.is_finite() && m.default_browning_s > 0.0) {
            eyre::bail!("model.default_browning_s must be > 0");
        }

        // Control
        let c = &self.control;
        if !(c.deadband.is_finite() && c.deadband >= 0.0) {
            eyre::bail!("control.deadband must be >= 0");
        }
        if !(c.rate_full.is_finite() && c.rate_full > 0.0) {
            eyre::bail!("control.rate_full must be > 0");
        }
        if !(c.rate_reduced.is_finite() && c.rate_reduced > 0.0) {
            eyre::bail!("control.rate_reduced must be > 0");
        }
        if !(c.max_adjustment_s.is_finite() && c.max_adjustment_s > 0.0) {
            eyre::bail!("control.max_adjustment_s must be > 0");
        }
        if !(c.stabilization_s.is_finite() && c.stabilization_s >= 0.0) {
            eyre::bail!("control.stabilization_s must be >= 0");
        }
        if !(c.check_interval_s.is_finite() && c.check_interval_s > 0.0) {
            eyre::bail!("control.check_interval_s must be > 0");
        }
        if c.poll_interval_ms > 10_000 {
            eyre::bail!("control.poll_interval_ms is unreasonably large (>10s)");
        }

        // Phase
        let p = &self.phase;
        if !(p.goldening_threshold_s.is_finite() && p.goldening_threshold_s > 0.0) {
            eyre::bail!("phase.goldening_threshold_s must be > 0");
        }
        let e = &p.effectiveness;
        if ![e.full, e.baseline, e.reduced]
            .into_iter()
            .all(|r| r.is_finite() && r > 0.0)
        {
            eyre::bail!("phase.effectiveness ratios must be > 0");
        }

        // Completion
        if self.completion.readings_needed == 0 {
            eyre::bail!("completion.readings_needed must be >= 1");
        }
        if !(self.completion.finish_buffer_s.is_finite() && self.completion.finish_buffer_s >= 0.0)
        {
            eyre::bail!("completion.finish_buffer_s must be >= 0");
        }

        // Record
        if self.record.path.trim().is_empty() {
            eyre::bail!("record.path must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Sim
        if self.sim.sample_period_ms == 0 {
            eyre::bail!("sim.sample_period_ms must be >= 1");
        }
        if !self.sim.bias.is_finite() {
            eyre::bail!("sim.bias must be finite");
        }

        Ok(())
    }
}
