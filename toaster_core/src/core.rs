//! The toasting control loop (`ToasterCore`).
//!
//! Each processed reading runs the same pipeline: effective-time update,
//! phase check, expected value, controller decision, completion check, and
//! one record for the run log.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use toaster_traits::clock::Clock;
use toaster_traits::{ColorSample, ColorSensor, Heater};

use crate::completion::{CompletionDetector, CountingStatus};
use crate::config::{PhaseCfg, Timeouts};
use crate::controller::{ControlMode, PowerController};
use crate::effective::EffectiveClock;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::model::{Model, PhaseEstimate};
use crate::phase::{Phase, PhaseTracker};
use crate::power::PowerLevel;
use crate::record::CycleRecord;
use crate::status::ToastingStatus;
use crate::util::round2;

/// Point-in-time copy of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub elapsed_s: f64,
    pub phase: Phase,
    pub transition_s: Option<f64>,
    pub power: PowerLevel,
    pub mode: ControlMode,
    pub effective_s: f64,
    pub effective_checkpoint_s: Option<f64>,
    pub target: Option<i32>,
    pub counting_active: bool,
    pub hits: u32,
    pub readings_needed: u32,
    pub estimated_finish_s: Option<f64>,
    /// Last `readings_needed` R values that were valid for control, oldest first.
    pub recent_valid: Vec<u32>,
    pub estimate: PhaseEstimate,
}

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct ToasterCore<S: ColorSensor, H: Heater> {
    pub(crate) sensor: S,
    pub(crate) heater: H,
    pub(crate) model: Model,
    pub(crate) phase_cfg: PhaseCfg,
    pub(crate) timeouts: Timeouts,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,

    pub(crate) effective: EffectiveClock,
    pub(crate) phase: PhaseTracker,
    pub(crate) controller: PowerController,
    pub(crate) completion: CompletionDetector,
    pub(crate) recent_valid: VecDeque<u32>,
    pub(crate) elapsed_s: f64,
    pub(crate) last_estimate: PhaseEstimate,
    pub(crate) last_r: Option<u32>,
    pub(crate) heater_off: bool,
    pub(crate) cycles: u64,
    pub(crate) skipped: u64,
}

impl<S: ColorSensor, H: Heater> core::fmt::Debug for ToasterCore<S, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToasterCore")
            .field("elapsed_s", &self.elapsed_s)
            .field("phase", &self.phase.phase())
            .field("power", &self.power())
            .field("effective_s", &self.effective.total())
            .field("target", &self.completion.target())
            .field("hits", &self.completion.hits())
            .finish()
    }
}

impl<S: ColorSensor, H: Heater> ToasterCore<S, H> {
    /// Power level in force, `Off` once the heater has been switched off.
    pub fn power(&self) -> PowerLevel {
        if self.heater_off {
            PowerLevel::Off
        } else {
            self.controller.power()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn effective_time(&self) -> f64 {
        self.effective.total()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed_s
    }

    pub fn transition_time(&self) -> Option<f64> {
        self.phase.transition_time()
    }

    pub fn hits(&self) -> u32 {
        self.completion.hits()
    }

    pub fn target(&self) -> Option<i32> {
        self.completion.target()
    }

    pub fn last_r(&self) -> Option<u32> {
        self.last_r
    }

    /// Processed and skipped cycle counts since `begin`.
    pub fn cycle_counts(&self) -> (u64, u64) {
        (self.cycles, self.skipped)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            elapsed_s: self.elapsed_s,
            phase: self.phase.phase(),
            transition_s: self.phase.transition_time(),
            power: self.power(),
            mode: self.controller.mode(),
            effective_s: self.effective.total(),
            effective_checkpoint_s: self.effective.checkpoint(),
            target: self.completion.target(),
            counting_active: self.completion.counting_active(),
            hits: self.completion.hits(),
            readings_needed: self.completion.readings_needed(),
            estimated_finish_s: self.completion.estimated_finish(),
            recent_valid: self.recent_valid.iter().copied().collect(),
            estimate: self.last_estimate,
        }
    }

    /// Reset per-run state, zero the clock and command baseline power.
    pub fn begin(&mut self) -> Result<()> {
        self.epoch = self.clock.now();
        self.effective.reset();
        self.phase.reset();
        self.controller.reset();
        self.recent_valid.clear();
        self.elapsed_s = 0.0;
        self.last_r = None;
        self.heater_off = false;
        self.cycles = 0;
        self.skipped = 0;

        let initial = self.model.initial_estimate();
        self.last_estimate = initial;
        let finish_s = initial.total();
        self.completion.arm(finish_s);

        let ratios = self.phase_cfg.effectiveness;
        let ctl = self.controller.cfg();
        tracing::info!(
            goldening_s = initial.remaining_goldening_s,
            browning_s = initial.remaining_browning_s,
            total_s = finish_s,
            earliest_end_s = (finish_s - self.completion.finish_buffer_s()).max(0.0),
            max_adjustment_s = ctl.max_adjustment_s,
            stabilization_s = ctl.stabilization_s,
            ratio_full = ratios.full,
            ratio_baseline = ratios.baseline,
            ratio_reduced = ratios.reduced,
            target = ?self.completion.target(),
            "toasting timeline"
        );

        self.command(PowerLevel::Baseline)?;
        self.effective
            .update(0.0, PowerLevel::Baseline, &self.phase_cfg.effectiveness);
        Ok(())
    }

    /// One iteration of the toasting loop (reads the sensor internally).
    pub fn step(&mut self) -> Result<ToastingStatus> {
        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let sample = self
            .sensor
            .read(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading color sensor")?;
        match sample {
            Some(s) => self.step_from_sample(s),
            None => {
                self.skipped += 1;
                tracing::trace!("no complete reading this cycle");
                Ok(ToastingStatus::Skipped)
            }
        }
    }

    /// Process a reading obtained elsewhere.
    pub fn step_from_sample(&mut self, sample: ColorSample) -> Result<ToastingStatus> {
        let now = self.clock.secs_since(self.epoch);
        let elapsed = round2(now);
        self.elapsed_s = elapsed;
        self.cycles += 1;
        self.last_r = Some(sample.red);

        // The interval since the last reading ran at the power in force before
        // this reading's decision.
        let power_before = self.controller.power();
        let effective = self
            .effective
            .update(now, power_before, &self.phase_cfg.effectiveness);

        if self
            .phase
            .check(elapsed, effective, self.phase_cfg.goldening_threshold_s)
        {
            tracing::info!(
                elapsed_s = elapsed,
                effective_s = effective,
                "phase transition: goldening complete, browning begins"
            );
        }
        let phase = self.phase.phase();

        let r = f64::from(sample.red);
        let expected =
            self.model
                .expected(phase, power_before, elapsed, self.phase.transition_time());
        let difference = r - expected;

        let decision = self.controller.evaluate(r, expected);
        if let Some(p) = decision.command {
            self.command(p)?;
        }

        let valid = self.controller.valid_for_control();
        if valid {
            self.recent_valid.push_back(sample.red);
            let cap = self.completion.readings_needed() as usize;
            while self.recent_valid.len() > cap {
                self.recent_valid.pop_front();
            }
        }

        let estimate = self.model.estimate(phase, effective, r);
        self.last_estimate = estimate;

        let reached = self.completion.observe(phase, valid, now, r);
        let counting = self.completion.status(now);

        let record = CycleRecord {
            elapsed_s: elapsed,
            power: self.controller.power(),
            phase,
            r: sample.red,
            g: sample.green,
            b: sample.blue,
            expected,
            difference,
            action: decision.action,
            effective_s: effective,
            valid,
            estimate,
            counting,
        };

        tracing::debug!(
            elapsed_s = elapsed,
            power = %record.power,
            phase = %phase,
            r = sample.red,
            expected,
            difference,
            effective_s = effective,
            valid,
            remaining_goldening_s = estimate.remaining_goldening_s,
            remaining_browning_s = estimate.remaining_browning_s,
            counting = %counting,
            action = %decision.action,
            "cycle"
        );

        if reached {
            let transition = self.phase.transition_time().unwrap_or(elapsed);
            tracing::info!(
                hits = self.completion.hits(),
                target = ?self.completion.target(),
                elapsed_s = elapsed,
                goldening_s = transition,
                browning_s = elapsed - transition,
                "target reached, stopping heater"
            );
            self.power_off()?;
            // The row keeps the power the reading was taken at.
            return Ok(ToastingStatus::Complete(CycleRecord {
                counting: CountingStatus::Active {
                    hits: self.completion.hits(),
                    needed: self.completion.readings_needed(),
                },
                ..record
            }));
        }
        Ok(ToastingStatus::Running(record))
    }

    /// Sleep the fixed delay between loop iterations.
    pub fn idle(&self) {
        self.clock.sleep(self.controller.cfg().poll_interval);
    }

    /// Switch the heater off.
    pub fn power_off(&mut self) -> Result<()> {
        self.heater
            .off()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("heater off")?;
        self.heater_off = true;
        Ok(())
    }

    /// Release sensor and heater; both are attempted even if one fails.
    pub fn close(&mut self) -> Result<()> {
        let sensor = self
            .sensor
            .close()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("closing color sensor");
        let heater = self
            .heater
            .close()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("closing heater");
        sensor.and(heater)
    }

    fn command(&mut self, level: PowerLevel) -> Result<()> {
        self.heater
            .set_power(level.percent())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("setting heater power to {level}"))?;
        self.heater_off = level == PowerLevel::Off;
        tracing::info!(power = %level, "heater power set");
        Ok(())
    }
}
