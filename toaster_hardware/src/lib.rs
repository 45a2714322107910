//! Device backends for the toaster controller.
//!
//! - [`serial`]: sensor and heater over any `BufRead`/`Write` pair speaking
//!   the two-line reading protocol from [`line`].
//! - `port` (feature `hardware`): opens a real serial port (`/dev/tty*`, `COM*`).
//! - [`sim`]: an in-process oven for runs without a board.

pub mod error;
pub mod line;
pub mod serial;
pub mod sim;
#[cfg(feature = "hardware")]
pub mod port;

pub use error::HwError;
pub use serial::{SerialHeater, SerialSensor};
pub use sim::{SimParams, SimToaster, SimulatedHeater, SimulatedSensor};
#[cfg(feature = "hardware")]
pub use port::{PortSettings, open_serial};
