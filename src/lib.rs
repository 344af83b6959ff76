//! Fortress User Agent Library
//!
//! Provisions and deprovisions OS user accounts on a single host through
//! idempotent, check-then-act shell step sequences with bounded execution.

pub mod audit;
pub mod config;
pub mod error;
pub mod executor;
pub mod ops;
pub mod provision;
pub mod validation;
