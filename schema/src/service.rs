//! Service and check specification types for the nanomon health monitor
//!
//! This module contains the configuration-side data structures: which services
//! are monitored and which probe commands back each of them, together with the
//! hysteresis thresholds that govern UP/DOWN transitions.
//!
//! ## Hysteresis Thresholds
//!
//! Raw probe results are debounced before they flip a check's state:
//! - `failure_threshold`: consecutive failures required to mark a check DOWN
//! - `success_threshold`: consecutive successes required to mark it UP again
//!
//! The defaults (16 failures, 1 success) make a check tolerant of flapping
//! probes while recovering on the first good result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Specification for one monitored service
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Service name, unique across the configuration
    pub name: String,

    /// Probe commands backing this service, in display order
    pub checks: Vec<CheckSpec>,
}

/// Specification for a single probe command
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckSpec {
    /// Stable identifier for state attribution; defaults to the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Command to execute
    pub command: String,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Number of consecutive failures before marking the check DOWN
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Number of consecutive successes to mark the check UP again
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Maximum time to wait for the probe in seconds; unlimited when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl CheckSpec {
    /// Stable identity key for this check
    ///
    /// Counters in the health record are attributed by `(service, key)`, never
    /// by list position, so reordering checks in the configuration does not
    /// reassign accumulated state.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let mut key = self.command.clone();
                for arg in &self.args {
                    key.push(' ');
                    key.push_str(arg);
                }
                key
            }
        }
    }

    /// Get the probe timeout as a Duration, if one is configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

const fn default_failure_threshold() -> u32 {
    16
}

const fn default_success_threshold() -> u32 {
    1
}
