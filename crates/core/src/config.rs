//! Configuration loading for `moorage.toml`.
//!
//! [`MoorageConfig`] is the top-level structure holding every section.
//!
//! # Loading precedence
//! 1. CLI arguments (highest)
//! 2. Environment variables (`MOORAGE_COMPOSE_FILE=stack.yml` form)
//! 3. Configuration file (`moorage.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), moorage_core::error::MoorageError> {
//! use moorage_core::config::MoorageConfig;
//!
//! // Load from file and apply env overrides
//! let config = MoorageConfig::load("moorage.toml").await?;
//!
//! // Parse a TOML string directly
//! let config = MoorageConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MoorageError};

/// Top-level harness configuration, one section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoorageConfig {
    /// Logging and output.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Compose invocation.
    #[serde(default)]
    pub compose: ComposeConfig,
    /// Health-convergence tuning.
    #[serde(default)]
    pub converge: ConvergeConfig,
}

impl MoorageConfig {
    /// Load from a TOML file and apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MoorageError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MoorageError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MoorageError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MoorageError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MoorageError> {
        toml::from_str(toml_str).map_err(|e| {
            MoorageError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Apply `MOORAGE_{SECTION}_{FIELD}` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MOORAGE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MOORAGE_GENERAL_LOG_FORMAT");

        // Compose
        override_string(&mut self.compose.compose_file, "MOORAGE_COMPOSE_FILE");
        override_string(&mut self.compose.project_name, "MOORAGE_COMPOSE_PROJECT_NAME");
        override_string(&mut self.compose.docker_socket, "MOORAGE_COMPOSE_DOCKER_SOCKET");
        override_u64(
            &mut self.compose.command_timeout_secs,
            "MOORAGE_COMPOSE_COMMAND_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.compose.service_start_timeout_secs,
            "MOORAGE_COMPOSE_SERVICE_START_TIMEOUT_SECS",
        );

        // Converge
        override_u64(
            &mut self.converge.poll_interval_secs,
            "MOORAGE_CONVERGE_POLL_INTERVAL_SECS",
        );
        override_opt_u64(
            &mut self.converge.timeout_override_secs,
            "MOORAGE_CONVERGE_TIMEOUT_OVERRIDE_SECS",
        );
    }

    /// Validate field values.
    pub fn validate(&self) -> Result<(), MoorageError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.compose.compose_file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "compose.compose_file".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.compose.command_timeout_secs == 0
            || self.compose.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "compose.command_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_COMMAND_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.compose.service_start_timeout_secs == 0
            || self.compose.service_start_timeout_secs > MAX_SERVICE_START_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "compose.service_start_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_SERVICE_START_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.converge.poll_interval_secs == 0
            || self.converge.poll_interval_secs > MAX_POLL_INTERVAL_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "converge.poll_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_SECS}"),
            }
            .into());
        }

        if let Some(secs) = self.converge.timeout_override_secs
            && (secs == 0 || secs > MAX_TIMEOUT_OVERRIDE_SECS)
        {
            return Err(ConfigError::InvalidValue {
                field: "converge.timeout_override_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_OVERRIDE_SECS}"),
            }
            .into());
        }

        Ok(())
    }
}

/// Upper bounds for validated fields.
const MAX_COMMAND_TIMEOUT_SECS: u64 = 3600;
const MAX_SERVICE_START_TIMEOUT_SECS: u64 = 3600;
const MAX_POLL_INTERVAL_SECS: u64 = 60;
const MAX_TIMEOUT_OVERRIDE_SECS: u64 = 7200;

/// Logging and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// trace, debug, info, warn, error.
    pub log_level: String,
    /// json or pretty.
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Compose invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Compose file driving the stack.
    pub compose_file: String,
    /// Compose project name; empty means compose's own default.
    pub project_name: String,
    /// Docker daemon socket path.
    pub docker_socket: String,
    /// Timeout for a single compose/docker command.
    pub command_timeout_secs: u64,
    /// How long to wait for compose to report a container for a service.
    pub service_start_timeout_secs: u64,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            compose_file: "docker-compose.yml".to_owned(),
            project_name: String::new(),
            docker_socket: "/var/run/docker.sock".to_owned(),
            command_timeout_secs: 300,
            service_start_timeout_secs: 120,
        }
    }
}

/// Health-convergence tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergeConfig {
    /// Sleep between health polls.
    pub poll_interval_secs: u64,
    /// Replace the per-container derived budget with a fixed value.
    pub timeout_override_secs: Option<u64>,
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            timeout_override_secs: None,
        }
    }
}

// --- Env override helpers ---

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        *target = value;
    }
}

fn override_u64(target: &mut u64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparseable env override"),
        }
    }
}

fn override_opt_u64(target: &mut Option<u64>, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = Some(parsed),
            Err(_) => warn!(var, value, "ignoring unparseable env override"),
        }
    }
}
