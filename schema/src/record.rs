//! Persisted health-record types for the nanomon status file
//!
//! The health record is the only memory nanomon has between invocations: one
//! short-lived process loads it, folds in fresh probe results, and writes it
//! back. Everything here is plain serializable data; the hysteresis rules that
//! mutate it live in the core crate.
//!
//! Counters are attributed by stable check key, so configuration edits that
//! reorder checks never reassign accumulated state.

use crate::events::current_timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Health record file format version
pub const RECORD_VERSION: u32 = 1;

/// Debounced health state of a check or service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum HealthState {
    /// Considered healthy
    Up,
    /// Considered failed
    Down,
}

impl HealthState {
    /// Check if the state is UP
    #[must_use]
    pub fn is_up(&self) -> bool {
        matches!(self, HealthState::Up)
    }

    /// Check if the state is DOWN
    #[must_use]
    pub fn is_down(&self) -> bool {
        matches!(self, HealthState::Down)
    }
}

/// Persisted state of a single check
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckHealth {
    /// Stable check identity key
    pub id: String,

    /// Current debounced state
    pub state: HealthState,

    /// Consecutive failed probes since the last success or transition
    pub consecutive_failures: u32,

    /// Consecutive successful probes since the last failure or transition
    pub consecutive_successes: u32,

    /// RFC3339 timestamp of the last state transition
    pub since: String,
}

impl CheckHealth {
    /// Create a clean entry: UP with zeroed counters
    #[must_use]
    pub fn clean(id: String) -> Self {
        Self {
            id,
            state: HealthState::Up,
            consecutive_failures: 0,
            consecutive_successes: 0,
            since: current_timestamp(),
        }
    }

    /// Check if this entry is UP with no failures accumulating
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.state.is_up() && self.consecutive_failures == 0
    }
}

/// Persisted state of one service and its checks
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    /// Service name
    pub name: String,

    /// Per-check entries in configuration order
    pub checks: Vec<CheckHealth>,
}

impl ServiceHealth {
    /// Aggregate service state: DOWN if any check is DOWN
    #[must_use]
    pub fn aggregate_state(&self) -> HealthState {
        if self.checks.iter().any(|c| c.state.is_down()) {
            HealthState::Down
        } else {
            HealthState::Up
        }
    }

    /// Check if every check is UP with no failures accumulating
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.checks.iter().all(CheckHealth::is_clear)
    }

    /// Iterate over the checks currently marked DOWN
    pub fn down_checks(&self) -> impl Iterator<Item = &CheckHealth> {
        self.checks.iter().filter(|c| c.state.is_down())
    }

    /// Look up a check entry by its identity key
    #[must_use]
    pub fn check(&self, id: &str) -> Option<&CheckHealth> {
        self.checks.iter().find(|c| c.id == id)
    }
}

/// Full health record written to the status file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// Format version
    pub version: u32,

    /// RFC3339 timestamp when this record was written
    pub timestamp: String,

    /// Per-service entries in configuration order
    pub services: Vec<ServiceHealth>,
}

impl HealthRecord {
    /// Create an empty record
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: RECORD_VERSION,
            timestamp: current_timestamp(),
            services: Vec::new(),
        }
    }

    /// Look up a service entry by name
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceHealth> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Check if every service is UP with no failures accumulating
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.services.iter().all(ServiceHealth::is_clear)
    }
}
