//! Idempotent account provisioning.
//!
//! Orchestrates create/delete/group-update sequences on top of the bounded
//! command runner, with live OS state checks before each mutating step.

mod handler;
mod request;
mod system;

pub use handler::Provisioner;
pub use request::ProvisioningRequest;
pub use system::{group_exists, user_exists, OsProbe, SystemProbe};
