//! Configuration loading and validation for monitored services
//!
//! This module parses a TOML configuration into `schema::ServiceSpec` values,
//! applies sane defaults (via serde defaults on schema types), and performs
//! strict validation with field-path error messages.

use crate::{MonitorError, Result};
use schema::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level TOML structure for the monitor configuration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Path of the durable health record file
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,

    /// Optional mail delivery settings
    pub notify: Option<NotifyConfig>,

    /// List of services to monitor
    pub services: Vec<ServiceSpec>,
}

/// Mail delivery settings for transition notifications
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    /// Sendmail-style argv; the message is piped to its stdin
    pub mail_command: Vec<String>,

    /// Recipients added as a To: header before the message
    #[serde(default)]
    pub recipients: Vec<String>,
}

fn default_status_file() -> PathBuf {
    PathBuf::from("nanomon.status")
}

impl MonitorConfig {
    /// Validate the configuration and return `Result<()>` with field-path errors
    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(MonitorError::ValidationError(
                "services: must contain at least one service".to_string(),
            ));
        }

        // Ensure unique service names
        let mut seen = HashSet::new();
        for (i, svc) in self.services.iter().enumerate() {
            if svc.name.trim().is_empty() {
                return Err(MonitorError::ValidationError(format!(
                    "services[{}].name: cannot be empty",
                    i
                )));
            }
            if !seen.insert(svc.name.clone()) {
                return Err(MonitorError::ValidationError(format!(
                    "services[{}].name: duplicate name '{}'",
                    i, svc.name
                )));
            }

            if svc.checks.is_empty() {
                return Err(MonitorError::ValidationError(format!(
                    "services[{}].checks: must contain at least one check",
                    i
                )));
            }

            // Check identity keys must be unique within the service
            let mut keys = HashSet::new();
            for (j, check) in svc.checks.iter().enumerate() {
                if let Some(id) = &check.id {
                    if id.trim().is_empty() {
                        return Err(MonitorError::ValidationError(format!(
                            "services[{}].checks[{}].id: cannot be empty",
                            i, j
                        )));
                    }
                }
                if check.command.trim().is_empty() {
                    return Err(MonitorError::ValidationError(format!(
                        "services[{}].checks[{}].command: cannot be empty",
                        i, j
                    )));
                }
                if check.failure_threshold == 0 {
                    return Err(MonitorError::ValidationError(format!(
                        "services[{}].checks[{}].failureThreshold: must be > 0",
                        i, j
                    )));
                }
                if check.success_threshold == 0 {
                    return Err(MonitorError::ValidationError(format!(
                        "services[{}].checks[{}].successThreshold: must be > 0",
                        i, j
                    )));
                }
                if check.timeout_secs == Some(0) {
                    return Err(MonitorError::ValidationError(format!(
                        "services[{}].checks[{}].timeoutSecs: must be > 0",
                        i, j
                    )));
                }
                if !keys.insert(check.key()) {
                    return Err(MonitorError::ValidationError(format!(
                        "services[{}].checks[{}]: duplicate check key '{}'",
                        i,
                        j,
                        check.key()
                    )));
                }
            }
        }

        if let Some(notify) = &self.notify {
            if notify.mail_command.is_empty() {
                return Err(MonitorError::ValidationError(
                    "notify.mailCommand: cannot be empty".to_string(),
                ));
            }
            if notify.mail_command[0].trim().is_empty() {
                return Err(MonitorError::ValidationError(
                    "notify.mailCommand[0]: cannot be empty".to_string(),
                ));
            }
            for (i, recipient) in notify.recipients.iter().enumerate() {
                if recipient.trim().is_empty() {
                    return Err(MonitorError::ValidationError(format!(
                        "notify.recipients[{}]: cannot be empty",
                        i
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Load the monitor configuration from a TOML file path
pub fn load_config_from_toml_path(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let data = fs::read_to_string(&path).map_err(|e| {
        MonitorError::ConfigurationError(format!(
            "Failed to read config {:?}: {}",
            path.as_ref(),
            e
        ))
    })?;
    load_config_from_toml_str(&data)
}

/// Load the monitor configuration from a TOML string
pub fn load_config_from_toml_str(input: &str) -> Result<MonitorConfig> {
    let cfg: MonitorConfig = toml::from_str(input)
        .map_err(|e| MonitorError::ConfigurationError(format!("TOML parse error: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}
