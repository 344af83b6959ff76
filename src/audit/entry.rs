//! Audit record types.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::executor::CommandOutput;

/// Maximum bytes of captured output kept in a record.
const MAX_OUTPUT_LENGTH: usize = 4096;

/// A single command execution record.
///
/// One record is appended per command invocation, holding the display-safe
/// command text together with the captured result and timing.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    /// ISO 8601 timestamp when the command finished.
    pub timestamp: String,
    /// Unique identifier for this invocation.
    pub invocation_id: Uuid,
    /// Display form of the executed command (secrets already redacted).
    pub command: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout, truncated.
    pub stdout: String,
    /// Captured stderr, truncated.
    pub stderr: String,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandRecord {
    /// Build a record from a finished command.
    pub fn new(command: &str, output: &CommandOutput, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            invocation_id: Uuid::new_v4(),
            command: command.to_string(),
            success: output.success,
            exit_code: output.exit_code,
            stdout: truncate(&output.stdout),
            stderr: truncate(&output.stderr),
            duration_ms,
        }
    }
}

fn truncate(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_LENGTH {
        return output.to_string();
    }
    let mut end = MAX_OUTPUT_LENGTH;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated {} bytes]", &output[..end], output.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            success,
            exit_code: if success { Some(0) } else { Some(1) },
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_record_serialization() {
        let record = CommandRecord::new("mkdir /devops", &output(true, "", ""), 12);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"command\":\"mkdir /devops\""));
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"exit_code\":0"));
        assert!(json.contains("\"duration_ms\":12"));
    }

    #[test]
    fn test_large_output_truncated() {
        let big = "x".repeat(10_000);
        let record = CommandRecord::new("cat big", &output(true, &big, ""), 3);
        assert!(record.stdout.len() < 5_000);
        assert!(record.stdout.contains("[truncated 10000 bytes]"));
    }

    #[test]
    fn test_failure_record_keeps_stderr() {
        let record = CommandRecord::new("userdel alice", &output(false, "", "no such user"), 5);
        assert!(!record.success);
        assert_eq!(record.stderr, "no such user");
    }
}
