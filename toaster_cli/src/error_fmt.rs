//! Human-readable error descriptions, exit codes and structured JSON errors.

use toaster_core::error::{BuildError, ToasterError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No color sensor was provided to the controller.\nLikely causes: The sensor backend failed to initialize or was not wired into the builder.\nHow to fix: Pass --sim or a working --port and check the startup log.".to_string()
            }
            BuildError::MissingHeater => {
                "What happened: No heater was provided to the controller.\nLikely causes: The relay backend failed to initialize or was not wired into the builder.\nHow to fix: Pass --sim or a working --port and check the startup log.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the flag, then rerun. See etc/toaster.toml for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<ToasterError>() {
        return match te {
            ToasterError::Timeout => "What happened: The color sensor did not deliver a reading in time.\nLikely causes: Board not powered, wrong port or baud rate, or serial.sensor_timeout_ms too low.\nHow to fix: Check the USB cable and [serial] in the config, then run `toaster self-check`.".to_string(),
            ToasterError::Io(msg) => format!(
                "What happened: I/O failure ({msg}).\nLikely causes: The board was unplugged, the port is held by another program, or the record file is not writable.\nHow to fix: Reconnect the board or pick another --record path, then rerun. The heater was commanded off."
            ),
            ToasterError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
            ),
            ToasterError::Hardware(msg) | ToasterError::HardwareFault(msg) => format!(
                "What happened: Hardware problem ({msg}).\nLikely causes: Serial device missing, wrong permissions, or an unsupported baud rate.\nHow to fix: Check [serial] in the config and that your user may open the port, or use --sim."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes: 2 config, 3 timeout, 4 hardware, 5 io, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => 2,
            BuildError::MissingSensor | BuildError::MissingHeater => 4,
        };
    }
    match err.downcast_ref::<ToasterError>() {
        Some(ToasterError::Config(_)) => 2,
        Some(ToasterError::Timeout) => 3,
        Some(ToasterError::Hardware(_) | ToasterError::HardwareFault(_)) => 4,
        Some(ToasterError::Io(_)) => 5,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "Config",
            BuildError::MissingSensor | BuildError::MissingHeater => "Hardware",
        };
    }
    match err.downcast_ref::<ToasterError>() {
        Some(ToasterError::Config(_)) => "Config",
        Some(ToasterError::Timeout) => "Timeout",
        Some(ToasterError::Hardware(_) | ToasterError::HardwareFault(_)) => "Hardware",
        Some(ToasterError::Io(_)) => "Io",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "error": err.to_string(),
        "message": humanize(err),
    })
    .to_string()
}
