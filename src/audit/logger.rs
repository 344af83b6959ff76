//! Audit logger for writing command records to file.
//!
//! Records are written as JSON lines (one object per line) so they can be
//! consumed by log analysis tools.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::AgentError;

use super::entry::CommandRecord;

/// Logger for command execution records.
///
/// Writes JSON lines to an append-mode file; thread-safe via an internal
/// mutex. A disabled logger drops records silently.
pub struct AuditLogger {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    /// Create a logger writing to the given path, creating the parent
    /// directory if needed.
    pub fn new(path: &Path) -> Result<Self, AgentError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!(path = %parent.display(), "creating audit log directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        debug!(path = %path.display(), "audit logger initialized");

        Ok(Self {
            file: Some(Mutex::new(file)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a no-op logger.
    pub fn disabled() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// Append one record as a JSON line and sync it to disk.
    pub fn log(&self, record: &CommandRecord) -> Result<(), AgentError> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let json = serde_json::to_string(record)?;

        let mut file = file.lock().map_err(|e| {
            AgentError::Io(std::io::Error::other(format!(
                "failed to acquire audit log lock: {}",
                e
            )))
        })?;

        writeln!(file, "{}", json)?;

        if let Err(e) = file.sync_data() {
            warn!(error = %e, "failed to sync audit log");
        }

        Ok(())
    }

    /// Path of the audit log file, if enabled.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use tempfile::TempDir;

    fn record(command: &str) -> CommandRecord {
        CommandRecord::new(
            command,
            &CommandOutput {
                success: true,
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            },
            1,
        )
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commands.log");
        let logger = AuditLogger::new(&path).unwrap();

        logger.log(&record("mkdir /devops")).unwrap();
        logger.log(&record("chown -R alice:alice /devops/alice")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["command"].is_string());
        }
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/log/commands.log");
        let logger = AuditLogger::new(&path).unwrap();
        logger.log(&record("echo ok")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_disabled_logger_is_noop() {
        let logger = AuditLogger::disabled();
        assert!(logger.log(&record("echo ok")).is_ok());
        assert!(logger.path().is_none());
    }
}
