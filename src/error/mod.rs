//! Error types for the fortress user agent.
//!
//! Structured failures carry a numeric code (40) and a diagnostic message;
//! everything else is classified as unexpected (50).

mod types;

pub use types::*;
