//! Per-reading run log records and the sink they are handed to.

use crate::completion::CountingStatus;
use crate::controller::Action;
use crate::model::PhaseEstimate;
use crate::phase::Phase;
use crate::power::PowerLevel;
use crate::util::round2;

/// Column names of the run log, in order.
pub const RECORD_HEADER: [&str; 10] = [
    "TimeElapsed",
    "PowerLevel",
    "Phase",
    "R",
    "G",
    "B",
    "ExpectedR",
    "Difference",
    "Action",
    "EffectiveTime",
];

/// One processed reading.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    /// Seconds since loop start, rounded to 0.01 s.
    pub elapsed_s: f64,
    /// Power in force after this reading's decision.
    pub power: PowerLevel,
    pub phase: Phase,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub expected: f64,
    pub difference: f64,
    pub action: Action,
    pub effective_s: f64,
    /// Whether the reading was taken at baseline power outside stabilization.
    pub valid: bool,
    pub estimate: PhaseEstimate,
    pub counting: CountingStatus,
}

impl CycleRecord {
    /// Log columns matching `RECORD_HEADER`.
    pub fn fields(&self) -> [String; 10] {
        [
            self.elapsed_s.to_string(),
            self.power.percent().to_string(),
            self.phase.name().to_string(),
            self.r.to_string(),
            self.g.to_string(),
            self.b.to_string(),
            round2(self.expected).to_string(),
            round2(self.difference).to_string(),
            self.action.to_string(),
            round2(self.effective_s).to_string(),
        ]
    }
}

/// Destination for cycle records. A failed write ends the run like any other
/// resource failure.
pub trait RecordSink {
    fn write(
        &mut self,
        record: &CycleRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn write(
        &mut self,
        record: &CycleRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(record)
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).flush()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn write(
        &mut self,
        _record: &CycleRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Keeps records in memory; handy for tests and summaries.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<CycleRecord>,
}

impl RecordSink for MemorySink {
    fn write(
        &mut self,
        record: &CycleRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.records.push(record.clone());
        Ok(())
    }
}
