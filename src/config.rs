//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::poller::PollSchedule;

/// Default budget for provisioning a group.
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Default budget for an in-place modification.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
/// Default budget for teardown.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Controller timing derived from environment variables and configuration
/// files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "RGCTL",
    discovery(
        app_name = "rgctl",
        env_var = "RGCTL_CONFIG_PATH",
        config_file_name = "rgctl.toml",
        dotfile_name = ".rgctl.toml",
        project_file_name = "rgctl.toml"
    )
)]
pub struct ControllerConfig {
    /// Seconds to wait for a new group to become available.
    #[ortho_config(default = 3600)]
    pub create_timeout_secs: u64,
    /// Seconds to wait for a modification to settle.
    #[ortho_config(default = 2400)]
    pub update_timeout_secs: u64,
    /// Seconds to wait for a group to disappear after delete.
    #[ortho_config(default = 900)]
    pub delete_timeout_secs: u64,
    /// Seconds to pause before the first status check.
    #[ortho_config(default = 20)]
    pub poll_delay_secs: u64,
    /// Seconds between status checks.
    #[ortho_config(default = 10)]
    pub poll_interval_secs: u64,
    /// Lower bound in seconds on the spacing between status checks.
    #[ortho_config(default = 5)]
    pub min_poll_interval_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ControllerConfig {
    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: set {} or {} in rgctl.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("rgctl")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Rejects zero timeouts and a zero polling floor. The initial delay and
    /// the requested interval may be zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the environment variable and
    /// TOML key to fix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_positive(
            self.create_timeout_secs,
            &FieldMetadata::new(
                "create timeout",
                "RGCTL_CREATE_TIMEOUT_SECS",
                "create_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.update_timeout_secs,
            &FieldMetadata::new(
                "update timeout",
                "RGCTL_UPDATE_TIMEOUT_SECS",
                "update_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.delete_timeout_secs,
            &FieldMetadata::new(
                "delete timeout",
                "RGCTL_DELETE_TIMEOUT_SECS",
                "delete_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.min_poll_interval_secs,
            &FieldMetadata::new(
                "minimum poll interval",
                "RGCTL_MIN_POLL_INTERVAL_SECS",
                "min_poll_interval_secs",
            ),
        )?;
        Ok(())
    }

    /// Values used when no source overrides them.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            create_timeout_secs: DEFAULT_CREATE_TIMEOUT.as_secs(),
            update_timeout_secs: DEFAULT_UPDATE_TIMEOUT.as_secs(),
            delete_timeout_secs: DEFAULT_DELETE_TIMEOUT.as_secs(),
            poll_delay_secs: 20,
            poll_interval_secs: 10,
            min_poll_interval_secs: 5,
        }
    }
}

/// Poll schedules used by each controller operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ControllerTimeouts {
    /// Wait for a new group to become available.
    pub create: PollSchedule,
    /// Wait for a modification to settle.
    pub update: PollSchedule,
    /// Wait for a group to disappear.
    pub delete: PollSchedule,
}

impl ControllerTimeouts {
    /// Schedules with the default timeouts and cadence.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            create: PollSchedule::new(DEFAULT_CREATE_TIMEOUT),
            update: PollSchedule::new(DEFAULT_UPDATE_TIMEOUT),
            delete: PollSchedule::new(DEFAULT_DELETE_TIMEOUT),
        }
    }

    /// Validates `config` and converts it into schedules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when validation fails.
    pub fn from_config(config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = |timeout_secs: u64| {
            PollSchedule::new(Duration::from_secs(timeout_secs))
                .with_delay(Duration::from_secs(config.poll_delay_secs))
                .with_intervals(
                    Duration::from_secs(config.poll_interval_secs),
                    Duration::from_secs(config.min_poll_interval_secs),
                )
        };
        Ok(Self {
            create: schedule(config.create_timeout_secs),
            update: schedule(config.update_timeout_secs),
            delete: schedule(config.delete_timeout_secs),
        })
    }
}

impl Default for ControllerTimeouts {
    fn default() -> Self {
        Self::standard()
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
