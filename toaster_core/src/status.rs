//! Status returned from each control loop iteration.

use crate::record::CycleRecord;

/// Public status of a single step of the toasting loop.
#[derive(Debug, Clone)]
pub enum ToastingStatus {
    /// No usable reading this cycle; nothing changed.
    Skipped,
    /// Reading processed; keep going.
    Running(CycleRecord),
    /// Target reached; heater already switched off.
    Complete(CycleRecord),
}

impl ToastingStatus {
    pub fn record(&self) -> Option<&CycleRecord> {
        match self {
            Self::Skipped => None,
            Self::Running(r) | Self::Complete(r) => Some(r),
        }
    }
}
