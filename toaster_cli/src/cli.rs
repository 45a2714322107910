//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "toaster", version, about = "Adaptive toaster browning control")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where readings come from and commands go.
#[derive(Args, Debug, Clone, Default)]
pub struct Backend {
    /// Serial device of the sensor/relay board (overrides serial.port)
    #[arg(long, value_name = "DEVICE", conflicts_with = "sim")]
    pub port: Option<String>,

    /// Use the built-in simulated toaster instead of a serial board
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,

    /// Run the simulator against the wall clock instead of accelerated time
    #[arg(long, action = ArgAction::SetTrue, requires = "sim")]
    pub realtime: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Toast until the target R value has been seen often enough
    Toast {
        /// Target R value; prompted for when omitted on a terminal
        #[arg(long, value_name = "R")]
        target: Option<i32>,

        /// CSV file for the per-reading log (overrides record.path)
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Never prompt for a target; run without completion if none is given
        #[arg(long = "no-prompt", action = ArgAction::SetTrue)]
        no_prompt: bool,

        #[command(flatten)]
        backend: Backend,
    },
    /// Open the sensor and heater, read one sample, switch the heater off
    SelfCheck {
        #[command(flatten)]
        backend: Backend,
    },
}
