//! Transition notifications: message formatting and mail delivery.
//!
//! A notification is an email-formatted text message produced exactly when a
//! service's aggregate state flips. The first line is always a `Subject:`
//! header so the message can be piped straight into a sendmail-style command;
//! run mode additionally prints every message to stdout.

use crate::config::NotifyConfig;
use crate::{MonitorError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Maximum probe output carried into an outage message
const MAX_OUTPUT_CHARS: usize = 400;

/// Detail about a failed check included in an outage message
#[derive(Debug, Clone)]
pub struct FailedCheck {
    /// Check identity key
    pub id: String,
    /// Exit code of the latest failing probe (None if killed by signal)
    pub exit_code: Option<i32>,
    /// Captured probe output, possibly empty
    pub output: String,
}

/// Format the outage message for a service that just went DOWN
///
/// The first line is exactly `Subject: DOWN: Service OUTAGE: <name>`.
#[must_use]
pub fn format_outage(service: &str, failed: &[FailedCheck], timestamp: &str) -> String {
    let mut message = format!("Subject: DOWN: Service OUTAGE: {}\n\n", service);
    message.push_str(&format!("Service {} is DOWN as of {}.\n", service, timestamp));

    if !failed.is_empty() {
        message.push_str("\nFailed checks:\n");
        for check in failed {
            match check.exit_code {
                Some(code) => {
                    message.push_str(&format!("  - {} (exit code {})\n", check.id, code))
                }
                None => message.push_str(&format!("  - {} (killed by signal)\n", check.id)),
            }
            let output = check.output.trim();
            if !output.is_empty() {
                for line in truncate(output, MAX_OUTPUT_CHARS).lines() {
                    message.push_str(&format!("    {}\n", line));
                }
            }
        }
    }

    message
}

/// Format the recovery message for a service that just came back UP
///
/// The first line is exactly `Subject: UP: Service restored: <name>`.
#[must_use]
pub fn format_recovery(service: &str, timestamp: &str) -> String {
    format!(
        "Subject: UP: Service restored: {}\n\nService {} is UP as of {}.\n",
        service, service, timestamp
    )
}

/// Trait for mail delivery backends, allowing for mocking in tests.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one formatted message.
    async fn deliver(&self, message: &str) -> Result<()>;
}

/// Mail delivery by piping the message to a sendmail-style command.
#[derive(Debug, Clone)]
pub struct CommandMailer {
    command: Vec<String>,
    recipients: Vec<String>,
}

impl CommandMailer {
    /// Create a mailer from the notify configuration
    #[must_use]
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            command: config.mail_command.clone(),
            recipients: config.recipients.clone(),
        }
    }
}

#[async_trait]
impl MailTransport for CommandMailer {
    async fn deliver(&self, message: &str) -> Result<()> {
        let program = self
            .command
            .first()
            .ok_or_else(|| MonitorError::NotificationError("mail command is empty".to_string()))?;

        debug!("Delivering notification via '{}'", program);

        let mut child = Command::new(program)
            .args(&self.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                MonitorError::NotificationError(format!("Failed to spawn '{}': {}", program, e))
            })?;

        // Recipients go in a To: header so sendmail -t style commands work
        let mut wire = String::new();
        if !self.recipients.is_empty() {
            wire.push_str(&format!("To: {}\n", self.recipients.join(", ")));
        }
        wire.push_str(message);
        if !wire.ends_with('\n') {
            wire.push('\n');
        }

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(wire.as_bytes()).await.map_err(|e| {
                MonitorError::NotificationError(format!(
                    "Failed to write message to '{}': {}",
                    program, e
                ))
            })?;
            stdin.shutdown().await.ok();
        }

        let status = child.wait().await.map_err(|e| {
            MonitorError::NotificationError(format!("Failed to wait for '{}': {}", program, e))
        })?;

        if !status.success() {
            return Err(MonitorError::NotificationError(format!(
                "'{}' exited with {}",
                program, status
            )));
        }

        Ok(())
    }
}

/// Trim probe output for inclusion in a message, marking the cut with "...".
/// Counts characters, not bytes, so multi-byte output never splits mid-codepoint.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outage_message_first_line() {
        let message = format_outage("test_checker", &[], "2024-01-01T00:00:00Z");
        assert!(message.starts_with("Subject: DOWN: Service OUTAGE: test_checker\n"));
    }

    #[test]
    fn test_recovery_message_first_line() {
        let message = format_recovery("test_checker", "2024-01-01T00:00:00Z");
        assert!(message.starts_with("Subject: UP: Service restored: test_checker\n"));
        assert!(message.contains("Service test_checker is UP as of 2024-01-01T00:00:00Z."));
    }

    #[test]
    fn test_outage_message_lists_failed_checks() {
        let failed = vec![
            FailedCheck {
                id: "curl -sf http://localhost/".to_string(),
                exit_code: Some(7),
                output: "connection refused\n".to_string(),
            },
            FailedCheck {
                id: "pg_isready".to_string(),
                exit_code: None,
                output: String::new(),
            },
        ];

        let message = format_outage("web", &failed, "2024-01-01T00:00:00Z");
        assert!(message.contains("curl -sf http://localhost/ (exit code 7)"));
        assert!(message.contains("    connection refused"));
        assert!(message.contains("pg_isready (killed by signal)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(500);
        let truncated = truncate(&long, 100);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with("..."));
    }

    #[tokio::test]
    async fn test_command_mailer_pipes_message() {
        let config = NotifyConfig {
            mail_command: vec!["sh".to_string(), "-c".to_string(), "cat > /dev/null".to_string()],
            recipients: Vec::new(),
        };

        let mailer = CommandMailer::new(&config);
        mailer
            .deliver("Subject: DOWN: Service OUTAGE: web\n\nbody\n")
            .await
            .expect("delivery should succeed");
    }

    #[tokio::test]
    async fn test_command_mailer_adds_recipient_header() {
        // grep exits 0 only if the To: header made it onto the wire
        let config = NotifyConfig {
            mail_command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "grep -q '^To: ops@example.net'".to_string(),
            ],
            recipients: vec!["ops@example.net".to_string()],
        };

        let mailer = CommandMailer::new(&config);
        mailer
            .deliver("Subject: UP: Service restored: web\n\nbody\n")
            .await
            .expect("delivery should succeed");
    }

    #[tokio::test]
    async fn test_command_mailer_reports_failure() {
        let config = NotifyConfig {
            mail_command: vec!["false".to_string()],
            recipients: Vec::new(),
        };

        let mailer = CommandMailer::new(&config);
        let err = mailer.deliver("Subject: test\n").await.unwrap_err();
        assert!(format!("{}", err).contains("Notification error"));
    }
}
