//! Live queries against OS account state.
//!
//! The OS user and group databases are the single source of truth and may
//! be mutated by other actors at any time, so every check re-reads them
//! rather than caching.

use nix::unistd::{Group, User};

use crate::error::AgentError;

/// Source of account-existence answers for the provisioner.
///
/// Production uses [`OsProbe`]; tests substitute a fixed state to exercise
/// the provisioning sequences without a mutable user database.
pub trait SystemProbe: Send + Sync {
    fn user_exists(&self, name: &str) -> Result<bool, AgentError>;
    fn group_exists(&self, name: &str) -> Result<bool, AgentError>;
}

/// Probe backed by the live passwd and group databases.
pub struct OsProbe;

impl SystemProbe for OsProbe {
    fn user_exists(&self, name: &str) -> Result<bool, AgentError> {
        user_exists(name)
    }

    fn group_exists(&self, name: &str) -> Result<bool, AgentError> {
        group_exists(name)
    }
}

/// Whether a user exists in the passwd database.
pub fn user_exists(name: &str) -> Result<bool, AgentError> {
    let user = User::from_name(name).map_err(std::io::Error::from)?;
    Ok(user.is_some())
}

/// Whether a group exists in the group database.
pub fn group_exists(name: &str) -> Result<bool, AgentError> {
    let group = Group::from_name(name).map_err(std::io::Error::from)?;
    Ok(group.is_some())
}
