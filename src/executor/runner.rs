//! Bounded local command execution.
//!
//! Runs a single shell command with:
//! - A minimal fixed environment (no inherited variables)
//! - A hard timeout enforced by a kill watchdog
//! - Captured stdout/stderr
//! - Start/end logging with a display-safe command string

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::audit::{AuditLogger, CommandRecord};
use crate::error::AgentError;

use super::watchdog::Watchdog;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed PATH for spawned commands. The rest of the environment is cleared
/// so provisioning cannot be influenced by inherited variables.
const LOCAL_PATH: &str = "/bin:/usr/local/sbin:/usr/local/bin:/sbin:/usr/sbin:/usr/bin";

/// Result of a local command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited successfully (exit code 0, no timeout).
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Executes shell commands with timeout enforcement and audit logging.
///
/// Non-zero exit (including a timeout kill) is reported in the returned
/// [`CommandOutput`]; only launch and decode failures surface as errors.
pub struct LocalRunner {
    audit: Arc<AuditLogger>,
    default_timeout: Duration,
}

impl LocalRunner {
    /// Create a runner writing command records to the given audit logger.
    pub fn new(audit: Arc<AuditLogger>, default_timeout: Duration) -> Self {
        Self {
            audit,
            default_timeout,
        }
    }

    /// Run a command with the default timeout, logged verbatim.
    pub fn execute(&self, command: &str) -> Result<CommandOutput, AgentError> {
        self.execute_with(command, None, self.default_timeout)
    }

    /// The timeout applied when the caller does not specify one.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run a command with an explicit timeout and an optional display form.
    ///
    /// The display form replaces the literal command in logs and audit
    /// records; pass one for commands carrying secrets.
    pub fn execute_with(
        &self,
        command: &str,
        display: Option<&str>,
        timeout: Duration,
    ) -> Result<CommandOutput, AgentError> {
        let display_cmd = display.unwrap_or(command);
        let started = Instant::now();

        info!(
            command = %display_cmd,
            timeout_secs = timeout.as_secs(),
            "[start] running local command"
        );

        let result = self.spawn_and_wait(command, display_cmd, timeout);
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => {
                info!(
                    command = %display_cmd,
                    exit_code = ?output.exit_code,
                    stdout = %output.stdout,
                    stderr = %output.stderr,
                    duration_ms,
                    "[end] local command finished"
                );
                let record = CommandRecord::new(display_cmd, output, duration_ms);
                // A lost audit record must not fail a command that already
                // ran; the record still lands in the tracing log above.
                if let Err(e) = self.audit.log(&record) {
                    warn!(command = %display_cmd, error = %e, "failed to write audit record");
                }
            }
            Err(e) => {
                error!(command = %display_cmd, error = %e, "local command execution failed");
            }
        }

        result
    }

    fn spawn_and_wait(
        &self,
        command: &str,
        display_cmd: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, AgentError> {
        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .env_clear()
            .env("PATH", LOCAL_PATH)
            // The shell leads its own process group, so a timeout kill
            // reaches everything it forked, not just the shell.
            .process_group(0)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Launch {
                message: format!("failed to spawn `{}`: {}", display_cmd, e),
            })?;

        // Armed watchdog releases on drop, so the timer is cancelled on
        // every exit path below, including `?` propagation.
        let watchdog = Watchdog::arm(child.id(), display_cmd.to_string(), timeout);

        let output = child.wait_with_output().map_err(|e| AgentError::Launch {
            message: format!("failed to wait for `{}`: {}", display_cmd, e),
        })?;

        let fired = watchdog.disarm();

        let stdout = decode_stream(output.stdout, "stdout", display_cmd)?;
        let stderr = decode_stream(output.stderr, "stderr", display_cmd)?;

        // A killed child reports a signal exit (non-zero); `!fired` guards
        // the race where it exits cleanly just as the watchdog fires.
        Ok(CommandOutput {
            success: output.status.success() && !fired,
            exit_code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

fn decode_stream(bytes: Vec<u8>, stream: &str, display_cmd: &str) -> Result<String, AgentError> {
    String::from_utf8(bytes).map_err(|e| AgentError::Decode {
        message: format!("{} of `{}` is not valid UTF-8: {}", stream, display_cmd, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> LocalRunner {
        LocalRunner::new(Arc::new(AuditLogger::disabled()), DEFAULT_TIMEOUT)
    }

    #[test]
    fn test_execute_echo() {
        let output = runner().execute("echo hello world").unwrap();
        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "hello world");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_nonzero_exit_is_ordinary_failure() {
        let output = runner().execute("false").unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(1));
    }

    #[test]
    fn test_missing_program_is_ordinary_failure() {
        // The shell itself launches fine; the lookup failure is an exit
        // status, not a launch error.
        let output = runner().execute("no_such_program_zz").unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(127));
    }

    #[test]
    fn test_stderr_capture() {
        let output = runner().execute("echo oops >&2").unwrap();
        assert!(output.success);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_environment_is_cleared() {
        let output = runner().execute("echo \"h=$HOME p=$PATH\"").unwrap();
        assert!(output.success);
        assert!(output.stdout.starts_with("h= p=/bin:"));
    }

    #[test]
    fn test_timeout_kills_command() {
        let output = runner()
            .execute_with("sleep 10", None, Duration::from_millis(200))
            .unwrap();
        assert!(!output.success);
    }

    #[test]
    fn test_timeout_returns_promptly() {
        let started = Instant::now();
        let output = runner()
            .execute_with("sleep 30", None, Duration::from_millis(200))
            .unwrap();
        assert!(!output.success);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_kills_forked_process_tree() {
        // The sleep here is a grandchild holding the stdout pipe; the group
        // kill has to take it down or the wait blocks for the full sleep.
        let started = Instant::now();
        let output = runner()
            .execute_with("/bin/sh -c 'sleep 30'", None, Duration::from_millis(300))
            .unwrap();
        assert!(!output.success);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_fast_command_does_not_wait_for_watchdog() {
        let started = Instant::now();
        let output = runner()
            .execute_with("echo quick", None, Duration::from_secs(30))
            .unwrap();
        assert!(output.success);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_audit_write_failure_does_not_fail_command() {
        // Writes to /dev/full fail with ENOSPC, so every audit append
        // errors out; the command result must be unaffected.
        let audit = AuditLogger::new(std::path::Path::new("/dev/full")).unwrap();
        let runner = LocalRunner::new(Arc::new(audit), DEFAULT_TIMEOUT);

        let output = runner.execute("echo ok").unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "ok");
    }

    #[test]
    fn test_decode_failure_is_fatal() {
        let started = Instant::now();
        let result = runner().execute("printf '\\377\\376'");
        assert!(matches!(result, Err(AgentError::Decode { .. })));
        // The watchdog must be released before the error propagates.
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
