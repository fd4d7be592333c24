//! Event system for the nanomon health monitor
//!
//! This module defines the events a monitoring run can produce: per-check
//! state changes, probe failures, and the service-level outage/restore edges
//! that drive notifications.
//!
//! Events are designed to be serializable and can be:
//! - Logged to structured log output
//! - Inspected by tests to assert transition behavior
//! - Rendered into notification messages

use crate::record::HealthState;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Events emitted during a monitoring run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum MonitorEvent {
    /// A single check crossed its hysteresis threshold
    CheckStateChanged {
        /// Service name
        service: String,
        /// Stable check identity key
        check_id: String,
        /// Previous state
        from_state: HealthState,
        /// New state
        to_state: HealthState,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// A probe command failed
    ProbeFailed {
        /// Service name
        service: String,
        /// Stable check identity key
        check_id: String,
        /// Exit code (None if killed by signal)
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// A service's aggregate state flipped to DOWN
    ServiceOutage {
        /// Service name
        service: String,
        /// Identity keys of the checks currently DOWN
        failed_checks: Vec<String>,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// A service's aggregate state flipped back to UP
    ServiceRestored {
        /// Service name
        service: String,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },
}

/// Event severity level for log mapping
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "camelCase")]
pub enum EventSeverity {
    /// Debug information
    Debug,
    /// Informational events
    Info,
    /// Warning conditions
    Warning,
    /// Critical conditions requiring attention
    Critical,
}

impl MonitorEvent {
    /// Get the service name for this event
    #[must_use]
    pub fn service(&self) -> &str {
        match self {
            Self::CheckStateChanged { service, .. }
            | Self::ProbeFailed { service, .. }
            | Self::ServiceOutage { service, .. }
            | Self::ServiceRestored { service, .. } => service,
        }
    }

    /// Get the timestamp for this event
    #[must_use]
    pub fn timestamp(&self) -> &str {
        match self {
            Self::CheckStateChanged { timestamp, .. }
            | Self::ProbeFailed { timestamp, .. }
            | Self::ServiceOutage { timestamp, .. }
            | Self::ServiceRestored { timestamp, .. } => timestamp,
        }
    }

    /// Get the severity level for this event
    #[must_use]
    pub fn severity(&self) -> EventSeverity {
        match self {
            Self::CheckStateChanged { to_state, .. } => {
                if to_state.is_down() {
                    EventSeverity::Warning
                } else {
                    EventSeverity::Info
                }
            }
            Self::ProbeFailed { .. } => EventSeverity::Debug,
            Self::ServiceOutage { .. } => EventSeverity::Critical,
            Self::ServiceRestored { .. } => EventSeverity::Info,
        }
    }

    /// Create a check state changed event
    #[must_use]
    pub fn check_state_changed(
        service: String,
        check_id: String,
        from_state: HealthState,
        to_state: HealthState,
    ) -> Self {
        Self::CheckStateChanged {
            service,
            check_id,
            from_state,
            to_state,
            timestamp: current_timestamp(),
        }
    }

    /// Create a probe failed event
    #[must_use]
    pub fn probe_failed(service: String, check_id: String, exit_code: Option<i32>) -> Self {
        Self::ProbeFailed {
            service,
            check_id,
            exit_code,
            timestamp: current_timestamp(),
        }
    }

    /// Create a service outage event
    #[must_use]
    pub fn service_outage(service: String, failed_checks: Vec<String>) -> Self {
        Self::ServiceOutage {
            service,
            failed_checks,
            timestamp: current_timestamp(),
        }
    }

    /// Create a service restored event
    #[must_use]
    pub fn service_restored(service: String) -> Self {
        Self::ServiceRestored {
            service,
            timestamp: current_timestamp(),
        }
    }
}

/// Create a current timestamp string in RFC3339 format (seconds precision)
#[must_use]
pub fn current_timestamp() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}
