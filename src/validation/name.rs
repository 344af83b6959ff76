//! Account name and key material validation.
//!
//! Validates names and key material for safe use with the system user
//! management commands built by the provisioner.

use crate::error::{AgentError, ValidationErrorKind};

/// Maximum length for system account names (Linux standard).
const MAX_NAME_LENGTH: usize = 32;

/// Accounts this tool refuses to create or delete.
const RESERVED_ACCOUNTS: &[&str] = &["root", "daemon", "bin", "sys", "nobody"];

/// Characters allowed in an OpenSSH public key line (type, base64 body,
/// optional comment such as an email address).
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '+' | '/' | '=' | ' ' | '@' | '.' | ':' | '_' | '-')
}

/// Validate a system account or group name.
///
/// Rules:
/// - Must not be empty
/// - Must not exceed 32 characters
/// - Must start with a lowercase letter
/// - May only contain lowercase letters, digits, underscores, and hyphens
pub fn validate_account_name(name: &str, param: &str) -> Result<(), AgentError> {
    if name.is_empty() {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::MissingArgument {
                param: param.to_string(),
            },
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: format!(
                    "'{}' exceeds maximum length of {} characters",
                    name, MAX_NAME_LENGTH
                ),
            },
        });
    }

    let first = name.chars().next().unwrap();
    if !first.is_ascii_lowercase() {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: format!("'{}' must start with a lowercase letter", name),
            },
        });
    }

    for c in name.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '_' && c != '-' {
            return Err(AgentError::Validation {
                kind: ValidationErrorKind::InvalidParameter {
                    param: param.to_string(),
                    message: format!(
                        "'{}' contains invalid character '{}'. Only lowercase letters, \
                         digits, underscores, and hyphens are allowed",
                        name, c
                    ),
                },
            });
        }
    }

    Ok(())
}

/// Validate the user an operation targets for creation or deletion.
///
/// Same rules as [`validate_account_name`], plus a reserved-name check so
/// the agent can never touch core system accounts.
pub fn validate_target_user(user: &str) -> Result<(), AgentError> {
    validate_account_name(user, "user")?;

    if RESERVED_ACCOUNTS.contains(&user) {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::ReservedAccount {
                name: user.to_string(),
            },
        });
    }

    Ok(())
}

/// Validate a comma-separated supplementary group list.
pub fn validate_group_list(groups: &str) -> Result<(), AgentError> {
    if groups.is_empty() {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::MissingArgument {
                param: "group".to_string(),
            },
        });
    }

    for group in groups.split(',') {
        validate_account_name(group, "group")?;
    }

    Ok(())
}

/// Validate an SSH public key line.
///
/// The key is written through the shell, so it must be a single line of
/// OpenSSH key characters.
pub fn validate_public_key(key: &str) -> Result<(), AgentError> {
    if key.is_empty() {
        return Err(AgentError::Validation {
            kind: ValidationErrorKind::MissingArgument {
                param: "public_key".to_string(),
            },
        });
    }

    for c in key.chars() {
        if !is_key_char(c) {
            return Err(AgentError::Validation {
                kind: ValidationErrorKind::InvalidParameter {
                    param: "public_key".to_string(),
                    message: format!("key contains invalid character {:?}", c),
                },
            });
        }
    }

    Ok(())
}
