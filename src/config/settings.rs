//! Configuration settings for the fortress user agent.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::AgentError;

/// Main configuration structure for the agent.
///
/// Every section has defaults so the tool runs without a config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub provision: ProvisionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Provisioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionConfig {
    /// Base directory under which managed home directories live.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Skeleton directory copied into fresh home directories.
    #[serde(default = "default_skel_dir")]
    pub skel_dir: PathBuf,
    /// Login shell assigned to created users.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Shared operational account whose password is refreshed on every
    /// create, alongside the target user's.
    #[serde(default = "default_ops_account")]
    pub ops_account: String,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub command_timeout_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional log file path; logs also go to stderr.
    pub file: Option<PathBuf>,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether the per-command audit log is enabled.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

// Default value functions
fn default_base_dir() -> PathBuf {
    PathBuf::from("/devops")
}

fn default_skel_dir() -> PathBuf {
    PathBuf::from("/etc/skel")
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

fn default_ops_account() -> String {
    "douyuops".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/fortress/commands.log")
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            skel_dir: default_skel_dir(),
            shell: default_shell(),
            ops_account: default_ops_account(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            command_timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_log_path(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AgentError::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| AgentError::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, AgentError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate settings consistency.
    pub fn validate(&self) -> Result<(), AgentError> {
        if !self.provision.base_dir.is_absolute() {
            return Err(AgentError::Config {
                message: format!(
                    "provision.base_dir must be an absolute path, got '{}'",
                    self.provision.base_dir.display()
                ),
            });
        }

        if !self.provision.skel_dir.is_absolute() {
            return Err(AgentError::Config {
                message: format!(
                    "provision.skel_dir must be an absolute path, got '{}'",
                    self.provision.skel_dir.display()
                ),
            });
        }

        if self.limits.command_timeout_seconds == 0 {
            return Err(AgentError::Config {
                message: "limits.command_timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.provision.ops_account.is_empty() {
            return Err(AgentError::Config {
                message: "provision.ops_account must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
