//! Audit logging module.
//!
//! Every command execution is recorded as a JSON line with its display-safe
//! command text, captured output, and timing.

mod entry;
mod logger;

pub use entry::CommandRecord;
pub use logger::AuditLogger;

/// Placeholder substituted for secrets in display-safe command strings.
///
/// Display commands are built by interpolating this placeholder where the
/// secret would go, never by searching the finished command for the secret;
/// shell quoting can rewrite the secret's bytes and defeat a search.
pub const REDACTED: &str = "[REDACTED]";
