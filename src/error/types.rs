//! Error types for the fortress user agent.

use thiserror::Error;

/// Exit code for structured failures: bad usage, unmet preconditions, and
/// provisioning steps that exited non-zero.
pub const CODE_STRUCTURED: u8 = 40;

/// Exit code for unexpected failures outside the structured convention.
pub const CODE_UNEXPECTED: u8 = 50;

/// Main error type for the agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration-related errors.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Invalid invocation: unknown operation or bad/missing arguments.
    #[error("{message}")]
    Usage { message: String },

    /// Input validation errors.
    #[error("validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// A precondition was not met; nothing has been mutated yet.
    #[error("{message}")]
    Precondition { message: String },

    /// A provisioning step exited non-zero; the system may be left
    /// partially modified.
    #[error("{kind}")]
    Step { kind: StepErrorKind },

    /// The command could not be spawned or waited on.
    #[error("command launch failed: {message}")]
    Launch { message: String },

    /// Captured command output was not valid UTF-8.
    #[error("output decode failed: {message}")]
    Decode { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors (audit records).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Numeric classification code, also used as the process exit code.
    pub fn code(&self) -> u8 {
        match self {
            AgentError::Usage { .. }
            | AgentError::Validation { .. }
            | AgentError::Precondition { .. }
            | AgentError::Step { .. } => CODE_STRUCTURED,
            AgentError::Config { .. }
            | AgentError::Launch { .. }
            | AgentError::Decode { .. }
            | AgentError::Io(_)
            | AgentError::Serialization(_) => CODE_UNEXPECTED,
        }
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("missing required argument: {param}")]
    MissingArgument { param: String },

    #[error("invalid value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("account name '{name}' is reserved and cannot be managed")]
    ReservedAccount { name: String },
}

/// Failed provisioning step kinds. Messages carry the full captured output
/// of the failing command for operator diagnosis.
#[derive(Error, Debug)]
pub enum StepErrorKind {
    /// A step of the create sequence failed.
    #[error(
        "{desc} failed, user: {user}, group: {group}, key: {key}, \
         stdout: {stdout}, stderr: {stderr}"
    )]
    Create {
        desc: String,
        user: String,
        group: String,
        key: String,
        stdout: String,
        stderr: String,
    },

    /// A plain setup command (mkdir, skeleton copy) failed.
    #[error("shell command `{command}` failed, stdout: {stdout}, stderr: {stderr}")]
    Shell {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// The combined delete step failed.
    #[error("delete user: {user} failed, stdout: {stdout}, stderr: {stderr}")]
    Delete {
        user: String,
        stdout: String,
        stderr: String,
    },

    /// The supplementary-group replacement failed.
    #[error("update_user_group, user: {user} failed, stdout: {stdout}, stderr: {stderr}")]
    UpdateGroups {
        user: String,
        stdout: String,
        stderr: String,
    },
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_errors_map_to_40() {
        let err = AgentError::Precondition {
            message: "group: devops not exists".to_string(),
        };
        assert_eq!(err.code(), 40);

        let err = AgentError::Usage {
            message: "unknown operation".to_string(),
        };
        assert_eq!(err.code(), 40);

        let err = AgentError::Step {
            kind: StepErrorKind::Delete {
                user: "alice".to_string(),
                stdout: String::new(),
                stderr: "userdel: user alice does not exist".to_string(),
            },
        };
        assert_eq!(err.code(), 40);
    }

    #[test]
    fn test_unexpected_errors_map_to_50() {
        let err = AgentError::Launch {
            message: "spawn failed".to_string(),
        };
        assert_eq!(err.code(), 50);

        let err = AgentError::Decode {
            message: "invalid utf-8".to_string(),
        };
        assert_eq!(err.code(), 50);

        let err: AgentError = std::io::Error::other("boom").into();
        assert_eq!(err.code(), 50);
    }

    #[test]
    fn test_precondition_message_format() {
        let err = AgentError::Precondition {
            message: "group: devops not exists".to_string(),
        };
        assert_eq!(err.to_string(), "group: devops not exists");
    }

    #[test]
    fn test_step_message_carries_captured_output() {
        let err = AgentError::Step {
            kind: StepErrorKind::Create {
                desc: "useradd".to_string(),
                user: "alice".to_string(),
                group: "devops".to_string(),
                key: "ssh-rsa AAAA".to_string(),
                stdout: "out".to_string(),
                stderr: "err".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("useradd failed"));
        assert!(msg.contains("user: alice"));
        assert!(msg.contains("stdout: out"));
        assert!(msg.contains("stderr: err"));
    }
}
