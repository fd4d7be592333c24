//! Schema definitions for nanomon
//!
//! This crate contains the shared data structures used across the nanomon
//! workspace: service/check specifications, the persisted health record, and
//! the events a monitoring run emits. All types here implement JSON Schema
//! generation for external consumption.

pub mod events;
pub mod record;
pub mod service;

pub use events::{current_timestamp, EventSeverity, MonitorEvent};
pub use record::{CheckHealth, HealthRecord, HealthState, ServiceHealth, RECORD_VERSION};
pub use service::{CheckSpec, ServiceSpec};

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::schema_for;

    #[test]
    fn test_schema_generation() {
        // Just check that schemas can be generated without panicking
        let _service_schema = schema_for!(ServiceSpec);
        let _record_schema = schema_for!(HealthRecord);
        let _event_schema = schema_for!(MonitorEvent);
    }

    #[test]
    fn test_health_state_serialization() {
        let up = serde_json::to_string(&HealthState::Up).unwrap();
        let down = serde_json::to_string(&HealthState::Down).unwrap();

        assert_eq!(up, "\"up\"");
        assert_eq!(down, "\"down\"");
    }
}
