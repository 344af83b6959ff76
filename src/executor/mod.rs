//! Bounded command execution module.
//!
//! Handles shell command spawning, timeout enforcement, and quoting.

mod quote;
mod runner;
mod watchdog;

pub use quote::shell_quote;
pub use runner::{CommandOutput, LocalRunner, DEFAULT_TIMEOUT};
pub use watchdog::Watchdog;
