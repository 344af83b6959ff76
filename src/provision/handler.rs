//! Idempotent account provisioning sequences.
//!
//! Each operation checks live OS state before every mutating step and
//! aborts the whole sequence on the first failure. There is no rollback:
//! a failed create may leave the account partially configured, and the
//! idempotent steps make a re-run converge.

use std::path::Path;

use tracing::{debug, info};

use crate::audit::REDACTED;
use crate::config::ProvisionConfig;
use crate::error::{AgentError, StepErrorKind};
use crate::executor::{shell_quote, LocalRunner};
use crate::validation::{
    validate_account_name, validate_group_list, validate_public_key, validate_target_user,
};

use super::request::ProvisioningRequest;
use super::system::{OsProbe, SystemProbe};

/// Orchestrates account provisioning on top of the bounded command runner.
pub struct Provisioner {
    config: ProvisionConfig,
    runner: LocalRunner,
    probe: Box<dyn SystemProbe>,
}

impl Provisioner {
    pub fn new(config: ProvisionConfig, runner: LocalRunner) -> Self {
        Self::with_probe(config, runner, Box::new(OsProbe))
    }

    /// Construct with a custom account-state probe.
    pub fn with_probe(
        config: ProvisionConfig,
        runner: LocalRunner,
        probe: Box<dyn SystemProbe>,
    ) -> Self {
        Self {
            config,
            runner,
            probe,
        }
    }

    /// Create a user account: home directory under the managed base dir,
    /// skeleton dotfiles, authorized SSH key, ownership, secondary group
    /// membership (unless a service account), and password refresh for both
    /// the target user and the shared operational account.
    pub fn create_user(&self, req: &ProvisioningRequest) -> Result<(), AgentError> {
        validate_target_user(&req.user)?;
        validate_public_key(&req.public_key)?;
        if !req.service_account {
            validate_account_name(&req.group, "group")?;
        }

        let user_exists = self.probe.user_exists(&req.user)?;
        let group_exists = req.service_account || self.probe.group_exists(&req.group)?;
        debug!(
            user = %req.user,
            user_exists,
            group_exists,
            "checked account preconditions"
        );

        if !group_exists {
            return Err(AgentError::Precondition {
                message: format!("group: {} not exists", req.group),
            });
        }

        let base = self.config.base_dir.as_path();
        if !base.exists() {
            self.run_setup(&format!("mkdir {}", base.display()))?;
        }

        let home = base.join(&req.user);
        if !user_exists {
            let command = useradd_command(&home, &req.user, &self.config.shell);
            self.run_create_step(&command, None, "useradd", &req.user, req)?;
        }

        if !home.exists() {
            self.run_setup(&format!("mkdir {}", home.display()))?;
        }

        // A missing .bashrc means the skeleton was never copied.
        if !home.join(".bashrc").exists() {
            self.run_setup(&skel_copy_command(&self.config.skel_dir, &home))?;
        }

        // Overwrite, never append: the latest supplied key wins.
        let command = authorized_keys_command(&home, &req.public_key);
        self.run_create_step(&command, None, "write authorized_keys", &req.user, req)?;

        let command = chown_command(&req.user, &home);
        self.run_create_step(&command, None, "chown", &req.user, req)?;

        if !req.service_account {
            let command = usermod_group_command(&home, &req.group, &req.user);
            self.run_create_step(&command, None, "add user to group", &req.user, req)?;
        }

        // Refresh the target user's password and keep the shared operational
        // account's credential in sync and un-expired.
        for account in [req.user.as_str(), self.config.ops_account.as_str()] {
            let command = chpasswd_command(account, &req.password);
            // The display form interpolates a placeholder instead of the
            // password; quoting inside the real command can rewrite the
            // password's bytes, so searching for it there is not safe.
            let display = chpasswd_command(account, REDACTED);
            self.run_create_step(&command, Some(&display), "change user password", account, req)?;
        }

        info!(user = %req.user, "user provisioned");
        Ok(())
    }

    /// Remove a user account together with its managed home directory in
    /// one combined invocation.
    pub fn delete_user(&self, user: &str) -> Result<(), AgentError> {
        validate_target_user(user)?;

        let home = self.config.base_dir.join(user);
        let output = self.runner.execute(&delete_command(user, &home))?;

        if !output.success {
            return Err(AgentError::Step {
                kind: StepErrorKind::Delete {
                    user: user.to_string(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            });
        }

        info!(user, "user deleted");
        Ok(())
    }

    /// Replace a user's supplementary group list with the supplied
    /// comma-separated group names.
    pub fn update_user_groups(&self, user: &str, groups: &str) -> Result<(), AgentError> {
        validate_target_user(user)?;
        validate_group_list(groups)?;

        let output = self.runner.execute(&update_groups_command(user, groups))?;

        if !output.success {
            return Err(AgentError::Step {
                kind: StepErrorKind::UpdateGroups {
                    user: user.to_string(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            });
        }

        info!(user, groups, "supplementary groups replaced");
        Ok(())
    }

    /// Run a plain setup command (mkdir, skeleton copy).
    fn run_setup(&self, command: &str) -> Result<(), AgentError> {
        let output = self.runner.execute(command)?;
        if !output.success {
            return Err(AgentError::Step {
                kind: StepErrorKind::Shell {
                    command: command.to_string(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            });
        }
        Ok(())
    }

    /// Run one step of the create sequence, mapping a non-zero exit to a
    /// step error carrying the full request context and captured output.
    fn run_create_step(
        &self,
        command: &str,
        display: Option<&str>,
        desc: &str,
        acting_user: &str,
        req: &ProvisioningRequest,
    ) -> Result<(), AgentError> {
        let output = self
            .runner
            .execute_with(command, display, self.runner_timeout())?;
        if !output.success {
            return Err(AgentError::Step {
                kind: StepErrorKind::Create {
                    desc: desc.to_string(),
                    user: acting_user.to_string(),
                    group: req.group.clone(),
                    key: req.public_key.clone(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            });
        }
        Ok(())
    }

    fn runner_timeout(&self) -> std::time::Duration {
        self.runner.default_timeout()
    }
}

fn useradd_command(home: &Path, user: &str, shell: &str) -> String {
    format!("useradd -d {} -m {} -s {}", home.display(), user, shell)
}

fn skel_copy_command(skel: &Path, home: &Path) -> String {
    format!("/bin/cp -rf {}/. {}", skel.display(), home.display())
}

fn authorized_keys_command(home: &Path, key: &str) -> String {
    let home = home.display();
    format!(
        "mkdir -p {home}/.ssh && echo {key} > {home}/.ssh/authorized_keys \
         && chmod 600 {home}/.ssh/authorized_keys",
        home = home,
        key = shell_quote(key),
    )
}

fn chown_command(user: &str, home: &Path) -> String {
    format!("chown -R {user}:{user} {home}", user = user, home = home.display())
}

fn usermod_group_command(home: &Path, group: &str, user: &str) -> String {
    format!("usermod -d {} -aG {} -m {}", home.display(), group, user)
}

fn chpasswd_command(account: &str, password: &str) -> String {
    format!(
        "echo {} | chpasswd",
        shell_quote(&format!("{}:{}", account, password))
    )
}

fn delete_command(user: &str, home: &Path) -> String {
    format!("userdel -r {} && rm -rf {}", user, home.display())
}

fn update_groups_command(user: &str, groups: &str) -> String {
    format!("usermod {} -G {}", user, groups)
}
