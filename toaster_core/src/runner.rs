use std::sync::atomic::{AtomicBool, Ordering};

use toaster_traits::{ColorSensor, Heater};

use crate::core::ToasterCore;
use crate::error::{Result as CoreResult, ToasterError};
use crate::power::PowerLevel;
use crate::record::RecordSink;
use crate::status::ToastingStatus;

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    TargetReached,
    Interrupted,
}

impl RunOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::Interrupted => "interrupted",
        }
    }
}

/// End-of-run figures.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub elapsed_s: f64,
    pub transition_s: Option<f64>,
    pub effective_s: f64,
    pub hits: u32,
    pub target: Option<i32>,
    pub last_r: Option<u32>,
    pub cycles: u64,
    pub skipped: u64,
}

/// Drive `toaster` until the target is reached or `stop` is raised.
///
/// The heater is switched off and both devices closed on every exit path,
/// including errors; cleanup failures are logged when they would otherwise
/// mask the original error.
pub fn run<S, H>(
    toaster: &mut ToasterCore<S, H>,
    sink: &mut dyn RecordSink,
    stop: &AtomicBool,
) -> CoreResult<RunSummary>
where
    S: ColorSensor,
    H: Heater,
{
    let result = toaster.begin().and_then(|()| drive(toaster, sink, stop));

    // Reaching the target already switched the heater off.
    let off = if toaster.power() == PowerLevel::Off {
        Ok(())
    } else {
        toaster.power_off()
    };
    let close = toaster.close();
    if let Err(e) = sink.flush() {
        tracing::warn!(error = %e, "flushing run log failed");
    }

    match result {
        Ok(outcome) => {
            off?;
            close?;
            let (cycles, skipped) = toaster.cycle_counts();
            let summary = RunSummary {
                outcome,
                elapsed_s: toaster.elapsed(),
                transition_s: toaster.transition_time(),
                effective_s: toaster.effective_time(),
                hits: toaster.hits(),
                target: toaster.target(),
                last_r: toaster.last_r(),
                cycles,
                skipped,
            };
            tracing::info!(
                outcome = outcome.as_str(),
                elapsed_s = summary.elapsed_s,
                effective_s = summary.effective_s,
                cycles,
                skipped,
                "toasting stopped, heater off"
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(off_err) = off {
                tracing::warn!(error = %off_err, "heater off failed during abort");
            }
            if let Err(close_err) = close {
                tracing::warn!(error = %close_err, "closing devices failed during abort");
            }
            tracing::error!(error = %e, "toasting aborted");
            Err(e)
        }
    }
}

fn drive<S, H>(
    toaster: &mut ToasterCore<S, H>,
    sink: &mut dyn RecordSink,
    stop: &AtomicBool,
) -> CoreResult<RunOutcome>
where
    S: ColorSensor,
    H: Heater,
{
    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!("toasting stopped by user");
            return Ok(RunOutcome::Interrupted);
        }
        let status = toaster.step()?;
        if let Some(rec) = status.record() {
            sink.write(rec)
                .map_err(|e| eyre::Report::new(ToasterError::Io(e.to_string())))?;
        }
        if let ToastingStatus::Complete(_) = status {
            return Ok(RunOutcome::TargetReached);
        }
        toaster.idle();
    }
}
