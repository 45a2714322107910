#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core toasting logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent browning controller. All
//! hardware interactions go through the `toaster_traits::ColorSensor` and
//! `toaster_traits::Heater` traits.
//!
//! ## Architecture
//!
//! - **Model**: regression curves mapping heating time to expected R (`model`)
//! - **Effective time**: power-weighted time at baseline (`effective`)
//! - **Phase**: one-way goldening → browning machine (`phase`)
//! - **Control**: deadband, bounded adjustments, stabilization (`controller`)
//! - **Completion**: windowed, non-consecutive target counting (`completion`)
//! - **Loop**: `ToasterCore` ties the above together per reading (`core`)
//!
//! Time inside the loop is `f64` seconds since `begin()`. Raw elapsed time
//! selects and evaluates curves; effective time only decides when browning
//! starts.

// Module declarations
pub mod builder;
pub mod completion;
pub mod config;
pub mod controller;
mod conversions;
pub mod core;
pub mod effective;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod model;
pub mod phase;
pub mod power;
pub mod record;
pub mod runner;
pub mod status;
pub mod util;

// ── Re-exports (preserve the public API surface) ─────────────────────────────

pub use builder::{Missing, Set, Toaster, ToasterBuilder, ToasterG, build_toaster};
pub use completion::{CompletionDetector, CountingStatus};
pub use config::{CompletionCfg, ControlCfg, Effectiveness, ModelCfg, PhaseCfg, Timeouts};
pub use controller::{Action, ControlMode, Decision, PowerController};
pub use crate::core::{ControllerSnapshot, ToasterCore};
pub use effective::EffectiveClock;
pub use error::{BuildError, Result, ToasterError};
pub use model::{Linear, Model, PhaseEstimate, Saturating};
pub use phase::{Phase, PhaseTracker};
pub use power::PowerLevel;
pub use record::{CycleRecord, MemorySink, NullSink, RECORD_HEADER, RecordSink};
pub use runner::{RunOutcome, RunSummary};
pub use status::ToastingStatus;
