//! Run orchestration: the evaluate-notify transaction and its siblings.
//!
//! One `run` is a full monitoring pass: take the store lock, load the prior
//! record (or start clean), execute every probe, fold the outcomes through
//! the hysteresis state machine, detect service-level edges against the prior
//! aggregate, save the rebuilt record, and only then emit notifications. A
//! failed save aborts before anything is emitted, so the same edge is
//! re-detected and notified by the next successful run instead of being lost.

use crate::config::MonitorConfig;
use crate::notify::{self, FailedCheck, MailTransport};
use crate::probe::{self, ProbeOutcome};
use crate::report::{self, StatusReport};
use crate::state::{self, CheckTransition};
use crate::store::StatusStore;
use crate::Result;
use schema::{
    current_timestamp, CheckHealth, EventSeverity, HealthRecord, HealthState, MonitorEvent,
    ServiceHealth, ServiceSpec, RECORD_VERSION,
};
use tracing::{debug, error, info, warn};

/// Outcome of one monitoring run
#[derive(Debug)]
pub struct RunReport {
    /// Events produced during the run, in evaluation order
    pub events: Vec<MonitorEvent>,
    /// Formatted notification messages, one per service-level edge
    pub messages: Vec<String>,
}

/// Execute one full monitoring pass.
///
/// Probes for all checks run concurrently; their results are folded in
/// configuration order so state updates and notification order are
/// deterministic. Mail delivery failures are logged and never affect the
/// persisted record or the returned report.
pub async fn run(config: &MonitorConfig, mailer: Option<&dyn MailTransport>) -> Result<RunReport> {
    let store = StatusStore::new(&config.status_file);
    let _guard = store.lock()?;
    let previous = store.load_or_default();

    let mut handles = Vec::with_capacity(config.services.len());
    for service in &config.services {
        let mut service_handles = Vec::with_capacity(service.checks.len());
        for check in &service.checks {
            let check = check.clone();
            service_handles.push(tokio::spawn(async move { probe::execute(&check).await }));
        }
        handles.push(service_handles);
    }

    let mut events = Vec::new();
    let mut messages = Vec::new();
    let mut services = Vec::with_capacity(config.services.len());

    for (service_spec, service_handles) in config.services.iter().zip(handles) {
        let prior = previous.service(&service_spec.name);
        let prior_state = prior.map_or(HealthState::Up, |s| s.aggregate_state());

        let mut checks = Vec::with_capacity(service_spec.checks.len());
        let mut failed = Vec::new();

        for (check_spec, handle) in service_spec.checks.iter().zip(service_handles) {
            let key = check_spec.key();
            // Counters are carried by identity key; new checks start clean
            // and entries for removed checks are dropped with the rebuild
            let mut health = prior
                .and_then(|s| s.check(&key))
                .cloned()
                .unwrap_or_else(|| CheckHealth::clean(key.clone()));

            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => ProbeOutcome::Failure {
                    exit_code: None,
                    output: format!("probe task failed: {}", e),
                },
            };

            if let ProbeOutcome::Failure { exit_code, .. } = &outcome {
                events.push(MonitorEvent::probe_failed(
                    service_spec.name.clone(),
                    key.clone(),
                    *exit_code,
                ));
            }

            if let Some(transition) = state::apply_outcome(check_spec, &mut health, &outcome) {
                let (from_state, to_state) = match transition {
                    CheckTransition::Failed => (HealthState::Up, HealthState::Down),
                    CheckTransition::Restored => (HealthState::Down, HealthState::Up),
                };
                events.push(MonitorEvent::check_state_changed(
                    service_spec.name.clone(),
                    key.clone(),
                    from_state,
                    to_state,
                ));
            }

            if health.state.is_down() {
                if let ProbeOutcome::Failure { exit_code, output } = &outcome {
                    failed.push(FailedCheck {
                        id: key.clone(),
                        exit_code: *exit_code,
                        output: output.clone(),
                    });
                }
            }

            checks.push(health);
        }

        let service_health = ServiceHealth {
            name: service_spec.name.clone(),
            checks,
        };

        // Only service-level edges produce notifications; per-check
        // transitions above are loggable events
        match (prior_state, service_health.aggregate_state()) {
            (HealthState::Up, HealthState::Down) => {
                let down_ids = service_health.down_checks().map(|c| c.id.clone()).collect();
                let event = MonitorEvent::service_outage(service_spec.name.clone(), down_ids);
                messages.push(notify::format_outage(
                    &service_spec.name,
                    &failed,
                    event.timestamp(),
                ));
                events.push(event);
            }
            (HealthState::Down, HealthState::Up) => {
                let event = MonitorEvent::service_restored(service_spec.name.clone());
                messages.push(notify::format_recovery(
                    &service_spec.name,
                    event.timestamp(),
                ));
                events.push(event);
            }
            _ => {}
        }

        services.push(service_health);
    }

    let record = HealthRecord {
        version: RECORD_VERSION,
        timestamp: current_timestamp(),
        services,
    };
    store.save(&record)?;

    for event in &events {
        log_event(event);
    }

    if let Some(mailer) = mailer {
        for message in &messages {
            if let Err(e) = mailer.deliver(message).await {
                warn!("Notification delivery failed: {}", e);
            }
        }
    }

    Ok(RunReport { events, messages })
}

/// Reinitialize the health record: every configured service and check
/// present, UP, with zeroed counters.
pub fn reset(config: &MonitorConfig) -> Result<()> {
    let store = StatusStore::new(&config.status_file);
    let _guard = store.lock()?;

    let record = HealthRecord {
        version: RECORD_VERSION,
        timestamp: current_timestamp(),
        services: config.services.iter().map(clean_service).collect(),
    };
    store.save(&record)?;

    info!("Health record reset at {}", store.path().display());
    Ok(())
}

/// Render the current health record without running any probes.
///
/// Reads without the store lock: atomic replacement guarantees a complete
/// record is always observed, and a missing or unreadable one renders clean.
pub fn status(config: &MonitorConfig) -> StatusReport {
    let store = StatusStore::new(&config.status_file);
    let record = store.load_or_default();
    report::render(&record)
}

fn clean_service(spec: &ServiceSpec) -> ServiceHealth {
    ServiceHealth {
        name: spec.name.clone(),
        checks: spec.checks.iter().map(|c| CheckHealth::clean(c.key())).collect(),
    }
}

fn log_event(event: &MonitorEvent) {
    let service = event.service();
    let text = match event {
        MonitorEvent::CheckStateChanged {
            check_id,
            from_state,
            to_state,
            ..
        } => format!(
            "Check '{}' of service '{}' went {:?} -> {:?}",
            check_id, service, from_state, to_state
        ),
        MonitorEvent::ProbeFailed {
            check_id, exit_code, ..
        } => format!(
            "Probe '{}' of service '{}' failed (exit code {:?})",
            check_id, service, exit_code
        ),
        MonitorEvent::ServiceOutage { failed_checks, .. } => format!(
            "Service '{}' is DOWN ({} failed check(s))",
            service,
            failed_checks.len()
        ),
        MonitorEvent::ServiceRestored { .. } => {
            format!("Service '{}' is UP again", service)
        }
    };

    match event.severity() {
        EventSeverity::Debug => debug!("{}", text),
        EventSeverity::Info => info!("{}", text),
        EventSeverity::Warning => warn!("{}", text),
        EventSeverity::Critical => error!("{}", text),
    }
}
