//! Probe execution for monitored checks
//!
//! A probe is one invocation of a check's external command. Exit status 0 is
//! success; everything else (non-zero exit, death by signal, a command that
//! cannot be launched, an elapsed timeout) is a failure carrying a captured
//! explanation. Probe failures are observations fed to the state machine,
//! never engine errors: a missing executable must accumulate toward DOWN the
//! same way a failing one does.

use schema::CheckSpec;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Synthetic exit code reported when the probe could not run to completion
pub const LAUNCH_FAILURE_CODE: i32 = 127;

/// Result of one probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Command exited with status 0
    Success,
    /// Command exited non-zero, was killed, timed out, or could not start
    Failure {
        /// Exit code (None if killed by signal)
        exit_code: Option<i32>,
        /// Captured stdout followed by stderr, or the launch error text
        output: String,
    },
}

impl ProbeOutcome {
    /// Check if the probe succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

/// Execute one probe command and classify the result
///
/// Waits for the command to exit, bounded by the check's timeout when one is
/// configured. The child is killed if the timeout elapses.
pub async fn execute(check: &CheckSpec) -> ProbeOutcome {
    debug!("Running probe: {} {:?}", check.command, check.args);

    let mut command = Command::new(&check.command);
    command.args(&check.args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    let result = match check.timeout() {
        Some(limit) => match tokio::time::timeout(limit, command.output()).await {
            Ok(result) => result,
            Err(_) => {
                return ProbeOutcome::Failure {
                    exit_code: Some(LAUNCH_FAILURE_CODE),
                    output: format!("probe timed out after {}s", limit.as_secs()),
                }
            }
        },
        None => command.output().await,
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            return ProbeOutcome::Failure {
                exit_code: Some(LAUNCH_FAILURE_CODE),
                output: format!("Failed to run '{}': {}", check.command, e),
            }
        }
    };

    if output.status.success() {
        return ProbeOutcome::Success;
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }

    ProbeOutcome::Failure {
        exit_code: output.status.code(),
        output: text,
    }
}
