//! Configuration module for the fortress user agent.
//!
//! Handles loading and validating agent configuration from TOML files.

mod settings;

pub use settings::*;
