//! Maps `Box<dyn Error>` from trait boundaries to typed `ToasterError`.
//!
//! The traits in `toaster_traits` use `Box<dyn Error + Send + Sync>` so any
//! transport can sit behind them; this module converts those to our typed
//! error enum, with an optional feature-gated path for
//! `toaster_hardware::HwError` downcasting.

use crate::error::ToasterError;

/// Map a trait-boundary error to a typed `ToasterError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ToasterError {
    #[cfg(feature = "hardware-errors")]
    {
        use toaster_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => ToasterError::Timeout,
                HwError::Io(io) => ToasterError::Io(io.to_string()),
                other => ToasterError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return if io.kind() == std::io::ErrorKind::TimedOut {
            ToasterError::Timeout
        } else {
            ToasterError::Io(io.to_string())
        };
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ToasterError::Timeout
    } else {
        ToasterError::Hardware(s)
    }
}
