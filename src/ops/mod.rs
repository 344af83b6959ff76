//! Operation dispatch for the command-line surface.
//!
//! The operation set is a closed enum; an unknown name or a short argument
//! list is rejected with a usage error before any handler runs.

use crate::error::AgentError;
use crate::provision::{Provisioner, ProvisioningRequest};

/// The operations this agent exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    DeleteUser,
    UpdateUserGroups,
}

impl Operation {
    /// Resolve an operation name from the command line.
    pub fn parse(name: &str) -> Result<Self, AgentError> {
        match name {
            "create_user" => Ok(Self::CreateUser),
            "delete_user" => Ok(Self::DeleteUser),
            "update_user_group" => Ok(Self::UpdateUserGroups),
            other => Err(AgentError::Usage {
                message: format!(
                    "unknown operation '{}': only create_user, delete_user or \
                     update_user_group is allowed",
                    other
                ),
            }),
        }
    }

    /// Number of positional arguments the operation requires.
    pub fn arity(&self) -> usize {
        match self {
            Self::CreateUser => 5,
            Self::DeleteUser => 1,
            Self::UpdateUserGroups => 2,
        }
    }

    fn usage(&self) -> &'static str {
        match self {
            Self::CreateUser => "create_user <user> <group> <public_key> <password> <is_service_account>",
            Self::DeleteUser => "delete_user <user>",
            Self::UpdateUserGroups => "update_user_group <user> <groups>",
        }
    }
}

/// Dispatch an operation with its positional arguments to the provisioner.
pub fn dispatch(
    provisioner: &Provisioner,
    operation: Operation,
    args: &[String],
) -> Result<(), AgentError> {
    if args.len() < operation.arity() {
        return Err(AgentError::Usage {
            message: format!(
                "too few arguments for {:?}: usage: {}",
                operation,
                operation.usage()
            ),
        });
    }

    match operation {
        Operation::CreateUser => {
            let request = ProvisioningRequest::from_args(&args[..5])?;
            provisioner.create_user(&request)
        }
        Operation::DeleteUser => provisioner.delete_user(&args[0]),
        Operation::UpdateUserGroups => provisioner.update_user_groups(&args[0], &args[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogger;
    use crate::config::ProvisionConfig;
    use crate::executor::{LocalRunner, DEFAULT_TIMEOUT};
    use std::sync::Arc;

    fn provisioner() -> Provisioner {
        let runner = LocalRunner::new(Arc::new(AuditLogger::disabled()), DEFAULT_TIMEOUT);
        Provisioner::new(ProvisionConfig::default(), runner)
    }

    #[test]
    fn test_parse_known_operations() {
        assert_eq!(Operation::parse("create_user").unwrap(), Operation::CreateUser);
        assert_eq!(Operation::parse("delete_user").unwrap(), Operation::DeleteUser);
        assert_eq!(
            Operation::parse("update_user_group").unwrap(),
            Operation::UpdateUserGroups
        );
    }

    #[test]
    fn test_parse_unknown_operation() {
        let err = Operation::parse("drop_table").unwrap_err();
        assert_eq!(err.code(), 40);
        assert!(err.to_string().contains("unknown operation 'drop_table'"));
    }

    #[test]
    fn test_arity() {
        assert_eq!(Operation::CreateUser.arity(), 5);
        assert_eq!(Operation::DeleteUser.arity(), 1);
        assert_eq!(Operation::UpdateUserGroups.arity(), 2);
    }

    #[test]
    fn test_dispatch_rejects_short_args() {
        let p = provisioner();
        let err = dispatch(&p, Operation::CreateUser, &["alice".to_string()]).unwrap_err();
        assert_eq!(err.code(), 40);
        assert!(err.to_string().contains("too few arguments"));
    }

    #[test]
    fn test_dispatch_delete_validates_user() {
        let p = provisioner();
        let args = vec!["bad name".to_string()];
        let err = dispatch(&p, Operation::DeleteUser, &args).unwrap_err();
        assert_eq!(err.code(), 40);
    }
}
