//! Target counting.
//!
//! A run ends once `readings_needed` readings at or below the operator's target
//! have been seen. Readings need not be consecutive, but only readings taken
//! in browning, at baseline power outside stabilization, and inside the
//! counting window are considered. The window opens `finish_buffer_s` before
//! the finish time estimated at loop start and then stays open.

use std::fmt;

use crate::config::CompletionCfg;
use crate::phase::Phase;

/// Counting progress as reported once per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountingStatus {
    /// No target was given.
    Disabled,
    /// Window not open yet; seconds until it opens.
    Waiting { opens_in_s: f64 },
    /// Window open but no qualifying reading has latched counting yet.
    Ready,
    Active { hits: u32, needed: u32 },
}

impl fmt::Display for CountingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("target counting disabled"),
            Self::Waiting { opens_in_s } => {
                write!(f, "time until target counting begins: {opens_in_s:.1}s")
            }
            Self::Ready => f.write_str("ready to begin target counting"),
            Self::Active { hits, needed } => {
                write!(f, "target counting active: {hits}/{needed} readings at/below target")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionDetector {
    cfg: CompletionCfg,
    target: Option<i32>,
    estimated_finish_s: Option<f64>,
    counting_active: bool,
    hits: u32,
}

impl CompletionDetector {
    pub fn new(cfg: CompletionCfg, target: Option<i32>) -> Self {
        Self {
            cfg,
            target,
            estimated_finish_s: None,
            counting_active: false,
            hits: 0,
        }
    }

    /// Fix the estimated finish time (seconds since loop start) and clear any
    /// counting progress.
    pub fn arm(&mut self, estimated_finish_s: f64) {
        self.estimated_finish_s = Some(estimated_finish_s);
        self.counting_active = false;
        self.hits = 0;
    }

    #[inline]
    pub fn target(&self) -> Option<i32> {
        self.target
    }

    #[inline]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    #[inline]
    pub fn counting_active(&self) -> bool {
        self.counting_active
    }

    #[inline]
    pub fn readings_needed(&self) -> u32 {
        self.cfg.readings_needed
    }

    #[inline]
    pub fn finish_buffer_s(&self) -> f64 {
        self.cfg.finish_buffer_s
    }

    #[inline]
    pub fn estimated_finish(&self) -> Option<f64> {
        self.estimated_finish_s
    }

    /// Seconds left before the estimated finish, never negative.
    pub fn time_to_finish(&self, now_s: f64) -> Option<f64> {
        self.estimated_finish_s.map(|f| (f - now_s).max(0.0))
    }

    pub fn window_open(&self, now_s: f64) -> bool {
        self.time_to_finish(now_s)
            .is_some_and(|left| left <= self.cfg.finish_buffer_s)
    }

    pub fn status(&self, now_s: f64) -> CountingStatus {
        if self.target.is_none() {
            return CountingStatus::Disabled;
        }
        match self.time_to_finish(now_s) {
            Some(left) if left > self.cfg.finish_buffer_s => CountingStatus::Waiting {
                opens_in_s: left - self.cfg.finish_buffer_s,
            },
            _ if self.counting_active => CountingStatus::Active {
                hits: self.hits,
                needed: self.cfg.readings_needed,
            },
            _ => CountingStatus::Ready,
        }
    }

    /// Consider one reading. Returns true once the target has been reached.
    ///
    /// `valid` is the controller's verdict after this cycle's update.
    pub fn observe(&mut self, phase: Phase, valid: bool, now_s: f64, value: f64) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        if phase != Phase::Browning || !valid {
            return false;
        }
        if !self.counting_active && self.window_open(now_s) {
            self.counting_active = true;
            self.hits = 0;
            tracing::info!(
                target,
                buffer_s = self.cfg.finish_buffer_s,
                "entering target counting: within buffer of estimated finish"
            );
        }
        if !self.counting_active {
            return false;
        }
        if value <= f64::from(target) {
            self.hits += 1;
            tracing::info!(
                hits = self.hits,
                needed = self.cfg.readings_needed,
                value,
                target,
                "reading at/below target"
            );
        }
        self.hits >= self.cfg.readings_needed
    }
}
