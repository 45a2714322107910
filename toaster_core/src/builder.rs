//! Type-state builder for `Toaster` and generic `build_toaster` constructor.
//!
//! The builder enforces at compile time that a sensor and a heater are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks. The target is optional: without one the loop monitors
//! and corrects but never completes on its own.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use toaster_traits::clock::{Clock, MonotonicClock};
use toaster_traits::{ColorSample, ColorSensor, Heater};

use crate::completion::CompletionDetector;
use crate::config::*;
use crate::controller::PowerController;
use crate::core::{ControllerSnapshot, ToasterCore};
use crate::effective::EffectiveClock;
use crate::error::{BuildError, Result};
use crate::model::Model;
use crate::phase::{Phase, PhaseTracker};
use crate::power::PowerLevel;
use crate::record::RecordSink;
use crate::runner::RunSummary;
use crate::status::ToastingStatus;

/// Largest target accepted; sensor channels are 16-bit.
pub const MAX_TARGET: i32 = 65_535;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Public dynamic (boxed) toaster controller.
pub struct Toaster {
    pub(crate) inner: ToasterCore<Box<dyn ColorSensor>, Box<dyn Heater>>,
}

impl core::fmt::Debug for Toaster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Toaster {
    /// Start building a Toaster.
    pub fn builder() -> ToasterBuilder<Missing, Missing> {
        ToasterBuilder::default()
    }

    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One iteration of the toasting loop.
    pub fn step(&mut self) -> Result<ToastingStatus> {
        self.inner.step()
    }

    pub fn step_from_sample(&mut self, sample: ColorSample) -> Result<ToastingStatus> {
        self.inner.step_from_sample(sample)
    }

    pub fn power_off(&mut self) -> Result<()> {
        self.inner.power_off()
    }

    pub fn power(&self) -> PowerLevel {
        self.inner.power()
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.inner.snapshot()
    }

    /// Run until the target is reached or `stop` is raised.
    pub fn run(&mut self, sink: &mut dyn RecordSink, stop: &AtomicBool) -> Result<RunSummary> {
        crate::runner::run(&mut self.inner, sink, stop)
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Toaster`. All fields are validated on `build()`.
pub struct ToasterBuilder<S, H> {
    sensor: Option<Box<dyn ColorSensor>>,
    heater: Option<Box<dyn Heater>>,
    model: Option<ModelCfg>,
    control: Option<ControlCfg>,
    phase: Option<PhaseCfg>,
    completion: Option<CompletionCfg>,
    timeouts: Option<Timeouts>,
    target: Option<i32>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _h: PhantomData<H>,
}

impl Default for ToasterBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            heater: None,
            model: None,
            control: None,
            phase: None,
            completion: None,
            timeouts: None,
            target: None,
            clock: None,
            _s: PhantomData,
            _h: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

/// Validate configuration and construct a `ToasterCore`.
///
/// This is the single source of truth for validation and construction,
/// used by both `ToasterBuilder::try_build()` and `build_toaster()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<S: ColorSensor, H: Heater>(
    sensor: S,
    heater: H,
    model: ModelCfg,
    control: ControlCfg,
    phase: PhaseCfg,
    completion: CompletionCfg,
    timeouts: Timeouts,
    target: Option<i32>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ToasterCore<S, H>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if let Some(t) = target
        && !(0..=MAX_TARGET).contains(&t)
    {
        return Err(invalid("target value out of range"));
    }
    if !non_negative(control.deadband) {
        return Err(invalid("deadband must be >= 0"));
    }
    if !positive(control.rate_full) || !positive(control.rate_reduced) {
        return Err(invalid("adjustment rates must be > 0"));
    }
    if !positive(control.max_adjustment_s) {
        return Err(invalid("max_adjustment_s must be > 0"));
    }
    if !non_negative(control.stabilization_s) {
        return Err(invalid("stabilization_s must be >= 0"));
    }
    if !positive(control.check_interval_s) {
        return Err(invalid("check_interval_s must be > 0"));
    }
    if !positive(phase.goldening_threshold_s) {
        return Err(invalid("goldening_threshold_s must be > 0"));
    }
    let r = phase.effectiveness;
    if !positive(r.full) || !positive(r.baseline) || !positive(r.reduced) {
        return Err(invalid("effectiveness ratios must be > 0"));
    }
    if completion.readings_needed == 0 {
        return Err(invalid("readings_needed must be >= 1"));
    }
    if !non_negative(completion.finish_buffer_s) {
        return Err(invalid("finish_buffer_s must be >= 0"));
    }
    if timeouts.sensor_ms == 0 {
        return Err(invalid("sensor_ms must be >= 1"));
    }
    if model.baseline_browning.slope == 0.0 || !model.baseline_browning.slope.is_finite() {
        return Err(invalid("baseline browning slope must be non-zero"));
    }
    if !model.neutral_value.is_finite() || !non_negative(model.min_remaining_s) {
        return Err(invalid("model fallbacks must be finite"));
    }

    // ── Construct ────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();
    let cap = completion.readings_needed as usize;

    Ok(ToasterCore {
        sensor,
        heater,
        model: Model::new(model, phase.goldening_threshold_s),
        phase_cfg: phase,
        timeouts,
        clock,
        epoch,
        effective: EffectiveClock::new(),
        phase: PhaseTracker::new(),
        controller: PowerController::new(control),
        completion: CompletionDetector::new(completion, target),
        recent_valid: VecDeque::with_capacity(cap),
        elapsed_s: 0.0,
        last_estimate: Default::default(),
        last_r: None,
        heater_off: false,
        cycles: 0,
        skipped: 0,
    })
}

impl<S, H> ToasterBuilder<S, H> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Toaster> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let heater = self
            .heater
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHeater))?;

        let inner = validate_and_build(
            sensor,
            heater,
            self.model.unwrap_or_default(),
            self.control.unwrap_or_default(),
            self.phase.unwrap_or_default(),
            self.completion.unwrap_or_default(),
            self.timeouts.unwrap_or_default(),
            self.target,
            self.clock,
        )?;

        Ok(Toaster { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, H> ToasterBuilder<S, H> {
    pub fn with_model(mut self, model: ModelCfg) -> Self {
        self.model = Some(model);
        self
    }
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }
    pub fn with_phase(mut self, phase: PhaseCfg) -> Self {
        self.phase = Some(phase);
        self
    }
    pub fn with_completion(mut self, completion: CompletionCfg) -> Self {
        self.completion = Some(completion);
        self
    }
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }
    /// Target R value; `None` disables completion.
    pub fn with_target(mut self, target: Option<i32>) -> Self {
        self.target = target;
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<H> ToasterBuilder<Missing, H> {
    pub fn with_sensor(self, sensor: impl ColorSensor + 'static) -> ToasterBuilder<Set, H> {
        ToasterBuilder {
            sensor: Some(Box::new(sensor)),
            heater: self.heater,
            model: self.model,
            control: self.control,
            phase: self.phase,
            completion: self.completion,
            timeouts: self.timeouts,
            target: self.target,
            clock: self.clock,
            _s: PhantomData,
            _h: PhantomData,
        }
    }
}

impl<S> ToasterBuilder<S, Missing> {
    pub fn with_heater(self, heater: impl Heater + 'static) -> ToasterBuilder<S, Set> {
        ToasterBuilder {
            sensor: self.sensor,
            heater: Some(Box::new(heater)),
            model: self.model,
            control: self.control,
            phase: self.phase,
            completion: self.completion,
            timeouts: self.timeouts,
            target: self.target,
            clock: self.clock,
            _s: PhantomData,
            _h: PhantomData,
        }
    }
}

impl ToasterBuilder<Set, Set> {
    /// Validate and build the Toaster. Only available when sensor and heater are set.
    pub fn build(self) -> Result<Toaster> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type ToasterG<S, H> = ToasterCore<S, H>;

/// Build a generic, statically-dispatched `ToasterG` from a concrete sensor and heater.
#[allow(clippy::too_many_arguments)]
pub fn build_toaster<S, H>(
    sensor: S,
    heater: H,
    model: ModelCfg,
    control: ControlCfg,
    phase: PhaseCfg,
    completion: CompletionCfg,
    timeouts: Timeouts,
    target: Option<i32>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ToasterG<S, H>>
where
    S: ColorSensor + 'static,
    H: Heater + 'static,
{
    validate_and_build(
        sensor, heater, model, control, phase, completion, timeouts, target, clock,
    )
}
