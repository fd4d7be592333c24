//! Core functionality for the nanomon project
//!
//! This crate contains the configuration model, probe execution, the
//! hysteresis state machine, the durable status store, and the
//! notification plumbing used by the CLI.

pub mod config;
pub mod error;
pub mod notify;
pub mod probe;
pub mod report;
pub mod runner;
pub mod state;
pub mod store;

// Re-export schema types for convenience
pub use schema::*;

pub use config::{load_config_from_toml_path, load_config_from_toml_str, MonitorConfig, NotifyConfig};
pub use error::{MonitorError, Result};
pub use notify::{CommandMailer, MailTransport};
pub use runner::RunReport;

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application.
    ///
    /// Logs go to stderr: stdout is reserved for status output and
    /// notification messages.
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| crate::MonitorError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_tracing_initialization_reports_an_error() {
        let _ = utils::init_tracing("warn");
        assert!(utils::init_tracing("warn").is_err());
    }
}
