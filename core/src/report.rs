//! Status reporting over the persisted health record.
//!
//! Rendering is read-only: probes never run here and the record is never
//! mutated, so `status` can be polled as often as wanted.

use schema::HealthRecord;

/// Rendered status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Report text, one line per service unless all clear
    pub text: String,
    /// True when every check is UP with no failures accumulating
    pub all_clear: bool,
}

impl StatusReport {
    /// Process exit code for this report
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.all_clear {
            0
        } else {
            1
        }
    }
}

/// Render the health record into a status report
///
/// An all-clear record renders exactly `OK`. Anything needing attention,
/// including services still UP with failures accumulating below threshold,
/// renders one `<name>, UP` or `<name>, DOWN` line per service in record
/// order.
#[must_use]
pub fn render(record: &HealthRecord) -> StatusReport {
    if record.is_clear() {
        return StatusReport {
            text: "OK".to_string(),
            all_clear: true,
        };
    }

    let lines: Vec<String> = record
        .services
        .iter()
        .map(|service| {
            let state = if service.aggregate_state().is_down() {
                "DOWN"
            } else {
                "UP"
            };
            format!("{}, {}", service.name, state)
        })
        .collect();

    StatusReport {
        text: lines.join("\n"),
        all_clear: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{CheckHealth, HealthState, ServiceHealth, RECORD_VERSION};

    fn record_with(services: Vec<ServiceHealth>) -> HealthRecord {
        HealthRecord {
            version: RECORD_VERSION,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            services,
        }
    }

    fn service(name: &str, state: HealthState, failures: u32) -> ServiceHealth {
        ServiceHealth {
            name: name.to_string(),
            checks: vec![CheckHealth {
                id: "check".to_string(),
                state,
                consecutive_failures: failures,
                consecutive_successes: 0,
                since: "2024-01-01T00:00:00Z".to_string(),
            }],
        }
    }

    #[test]
    fn clean_record_reports_ok() {
        let report = render(&record_with(vec![service("web", HealthState::Up, 0)]));
        assert_eq!(report.text, "OK");
        assert!(report.all_clear);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn empty_record_reports_ok() {
        let report = render(&record_with(Vec::new()));
        assert_eq!(report.text, "OK");
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn accumulating_failures_need_attention_while_up() {
        let report = render(&record_with(vec![service("web", HealthState::Up, 15)]));
        assert_eq!(report.text, "web, UP");
        assert!(!report.all_clear);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn down_service_reports_down() {
        let report = render(&record_with(vec![service("web", HealthState::Down, 0)]));
        assert_eq!(report.text, "web, DOWN");
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn services_render_in_record_order() {
        let report = render(&record_with(vec![
            service("web", HealthState::Up, 3),
            service("db", HealthState::Down, 0),
        ]));
        assert_eq!(report.text, "web, UP\ndb, DOWN");
        assert_eq!(report.exit_code(), 1);
    }
}
