//! Core error types and utilities

use thiserror::Error;

/// Monitor-specific error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Other(String),
}

impl MonitorError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            MonitorError::ConfigurationError(_) => "NMON001",
            MonitorError::ValidationError(_) => "NMON002",
            MonitorError::InitializationError(_) => "NMON003",
            MonitorError::NotificationError(_) => "NMON004",
            MonitorError::IoError(_) => "NMON005",
            MonitorError::SerializationError(_) => "NMON006",
            MonitorError::Other(_) => "NMON999",
        }
    }
}

/// Monitor-specific result type
pub type Result<T> = std::result::Result<T, MonitorError>;

// Convenience implementations
impl From<&str> for MonitorError {
    fn from(s: &str) -> Self {
        MonitorError::Other(s.to_string())
    }
}

impl From<String> for MonitorError {
    fn from(s: String) -> Self {
        MonitorError::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MonitorError::ConfigurationError("test".to_string()).code(),
            "NMON001"
        );
        assert_eq!(
            MonitorError::ValidationError("test".to_string()).code(),
            "NMON002"
        );
        assert_eq!(
            MonitorError::InitializationError("test".to_string()).code(),
            "NMON003"
        );
        assert_eq!(
            MonitorError::NotificationError("test".to_string()).code(),
            "NMON004"
        );
        assert_eq!(MonitorError::Other("test".to_string()).code(), "NMON999");
    }

    #[test]
    fn test_error_display() {
        let error = MonitorError::ConfigurationError("missing services".to_string());
        assert_eq!(error.to_string(), "Configuration error: missing services");
    }

    #[test]
    fn test_from_implementations() {
        let error: MonitorError = "test error".into();
        assert_eq!(error.to_string(), "Generic error: test error");

        let error: MonitorError = "test error".to_string().into();
        assert_eq!(error.to_string(), "Generic error: test error");
    }
}
