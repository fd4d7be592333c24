//! Hysteresis state machine for check health
//!
//! This module implements the debounce logic that converts raw probe outcomes
//! into stable UP/DOWN verdicts. A check flips DOWN only after
//! `failure_threshold` consecutive failures and flips back UP only after
//! `success_threshold` consecutive successes. Both counters are zeroed on a
//! transition, and any opposite result resets the other counter, so the two
//! are never nonzero at the same time.

use crate::probe::ProbeOutcome;
use schema::{current_timestamp, CheckHealth, CheckSpec, HealthState};
use tracing::debug;

/// Threshold crossing produced by applying one probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTransition {
    /// The check crossed its failure threshold and is now DOWN
    Failed,
    /// The check crossed its success threshold and is now UP
    Restored,
}

/// Apply one probe outcome to a check's persisted state
///
/// Returns the transition if this outcome crossed a threshold, `None` while
/// the check stays in its current state. A transition is reported exactly
/// once per edge: a check already DOWN produces no further `Failed`
/// transitions however long the failures continue.
pub fn apply_outcome(
    check: &CheckSpec,
    health: &mut CheckHealth,
    outcome: &ProbeOutcome,
) -> Option<CheckTransition> {
    match outcome {
        ProbeOutcome::Success => {
            health.consecutive_successes = health.consecutive_successes.saturating_add(1);
            health.consecutive_failures = 0;

            if health.state.is_down() && health.consecutive_successes >= check.success_threshold {
                debug!(
                    "Check '{}' restored after {} consecutive successes",
                    health.id, health.consecutive_successes
                );
                health.state = HealthState::Up;
                health.consecutive_successes = 0;
                health.since = current_timestamp();
                return Some(CheckTransition::Restored);
            }
        }
        ProbeOutcome::Failure { .. } => {
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
            health.consecutive_successes = 0;

            if health.state.is_up() && health.consecutive_failures >= check.failure_threshold {
                debug!(
                    "Check '{}' failed after {} consecutive failures",
                    health.id, health.consecutive_failures
                );
                health.state = HealthState::Down;
                health.consecutive_failures = 0;
                health.since = current_timestamp();
                return Some(CheckTransition::Failed);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_check(failure_threshold: u32, success_threshold: u32) -> CheckSpec {
        CheckSpec {
            id: None,
            command: "check".to_string(),
            args: Vec::new(),
            failure_threshold,
            success_threshold,
            timeout_secs: None,
        }
    }

    fn success() -> ProbeOutcome {
        ProbeOutcome::Success
    }

    fn failure() -> ProbeOutcome {
        ProbeOutcome::Failure {
            exit_code: Some(1),
            output: String::new(),
        }
    }

    #[test]
    fn test_counters_are_mutually_exclusive() {
        let check = create_check(16, 1);
        let mut health = CheckHealth::clean("check".to_string());

        apply_outcome(&check, &mut health, &failure());
        assert_eq!(health.consecutive_failures, 1);
        assert_eq!(health.consecutive_successes, 0);

        apply_outcome(&check, &mut health, &success());
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.consecutive_successes, 1);
    }

    #[test]
    fn test_transition_to_down_at_threshold() {
        let check = create_check(3, 1);
        let mut health = CheckHealth::clean("check".to_string());

        assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        assert_eq!(health.state, HealthState::Up);
        assert_eq!(health.consecutive_failures, 2);

        let transition = apply_outcome(&check, &mut health, &failure());
        assert_eq!(transition, Some(CheckTransition::Failed));
        assert_eq!(health.state, HealthState::Down);
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.consecutive_successes, 0);
    }

    #[test]
    fn test_no_repeat_transition_while_down() {
        let check = create_check(2, 1);
        let mut health = CheckHealth::clean("check".to_string());

        apply_outcome(&check, &mut health, &failure());
        assert_eq!(
            apply_outcome(&check, &mut health, &failure()),
            Some(CheckTransition::Failed)
        );

        // Further failures accumulate but never re-signal the edge
        assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        assert_eq!(health.state, HealthState::Down);
        assert_eq!(health.consecutive_failures, 2);
    }

    #[test]
    fn test_recovery_on_first_success_by_default() {
        let check = create_check(2, 1);
        let mut health = CheckHealth::clean("check".to_string());

        apply_outcome(&check, &mut health, &failure());
        apply_outcome(&check, &mut health, &failure());
        assert_eq!(health.state, HealthState::Down);

        let transition = apply_outcome(&check, &mut health, &success());
        assert_eq!(transition, Some(CheckTransition::Restored));
        assert_eq!(health.state, HealthState::Up);
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.consecutive_successes, 0);
    }

    #[test]
    fn test_success_threshold_requires_full_run() {
        let check = create_check(1, 3);
        let mut health = CheckHealth::clean("check".to_string());

        apply_outcome(&check, &mut health, &failure());
        assert_eq!(health.state, HealthState::Down);

        assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        assert_eq!(health.consecutive_successes, 2);

        // An interleaved failure restarts the success run
        assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        assert_eq!(health.consecutive_successes, 0);
        assert_eq!(health.state, HealthState::Down);

        assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        assert_eq!(
            apply_outcome(&check, &mut health, &success()),
            Some(CheckTransition::Restored)
        );
        assert_eq!(health.state, HealthState::Up);
    }

    #[test]
    fn test_lone_success_clears_accumulated_failures() {
        let check = create_check(16, 1);
        let mut health = CheckHealth::clean("check".to_string());

        for _ in 0..15 {
            assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        }
        assert_eq!(health.state, HealthState::Up);
        assert_eq!(health.consecutive_failures, 15);

        // One good probe wipes the run; the next failure starts from scratch
        assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        assert_eq!(health.consecutive_failures, 0);

        for _ in 0..15 {
            assert_eq!(apply_outcome(&check, &mut health, &failure()), None);
        }
        assert_eq!(health.state, HealthState::Up);

        assert_eq!(
            apply_outcome(&check, &mut health, &failure()),
            Some(CheckTransition::Failed)
        );
        assert_eq!(health.state, HealthState::Down);
    }

    #[test]
    fn test_success_while_up_is_quiet() {
        let check = create_check(16, 1);
        let mut health = CheckHealth::clean("check".to_string());

        for _ in 0..5 {
            assert_eq!(apply_outcome(&check, &mut health, &success()), None);
        }
        assert_eq!(health.state, HealthState::Up);
        assert_eq!(health.consecutive_failures, 0);
    }
}
