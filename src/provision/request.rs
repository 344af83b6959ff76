//! Provisioning request type.

use crate::error::{AgentError, ValidationErrorKind};

/// Inputs for one create-user run.
///
/// Built from positional CLI arguments; lives only for the duration of the
/// provisioning call and is never persisted.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    /// Account to create.
    pub user: String,
    /// Secondary group the user joins (ignored for service accounts).
    pub group: String,
    /// SSH public key written to the user's authorized_keys.
    pub public_key: String,
    /// Password set for the user and the shared operational account.
    pub password: String,
    /// Service accounts skip the secondary-group membership step.
    pub service_account: bool,
}

impl ProvisioningRequest {
    /// Build a request from the create operation's five positional args:
    /// user, group, public key, password, service-account flag (`0`/`1`).
    pub fn from_args(args: &[String]) -> Result<Self, AgentError> {
        let [user, group, public_key, password, flag] = args else {
            return Err(AgentError::Validation {
                kind: ValidationErrorKind::MissingArgument {
                    param: "create_user arguments".to_string(),
                },
            });
        };

        let service_account = parse_service_flag(flag)?;

        Ok(Self {
            user: user.clone(),
            group: group.clone(),
            public_key: public_key.clone(),
            password: password.clone(),
            service_account,
        })
    }
}

/// Coerce the service-account flag to a boolean; any nonzero integer is true.
fn parse_service_flag(flag: &str) -> Result<bool, AgentError> {
    flag.trim()
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| AgentError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: "is_service_account".to_string(),
                message: format!("expected an integer flag, got '{}'", flag),
            },
        })
}
