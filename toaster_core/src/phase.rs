//! Goldening → browning phase tracking.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Goldening,
    Browning,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Goldening => "goldening",
            Self::Browning => "browning",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One-way phase machine. Browning is terminal.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    phase: Phase,
    transition_s: Option<f64>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Raw elapsed time at which browning began.
    #[inline]
    pub fn transition_time(&self) -> Option<f64> {
        self.transition_s
    }

    /// Move to browning once `effective_s` exceeds `threshold_s`, stamping the
    /// raw `elapsed_s`. Returns true only on the call that transitions.
    pub fn check(&mut self, elapsed_s: f64, effective_s: f64, threshold_s: f64) -> bool {
        if self.phase == Phase::Goldening && effective_s > threshold_s {
            self.phase = Phase::Browning;
            self.transition_s = Some(elapsed_s);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
