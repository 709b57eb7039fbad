//! Error types for the ecosystem logging runtime
//!
//! Only `LoggerError` ever crosses the public boundary of a log call.
//! `RemoteStoreError` is produced at the remote-append boundary and is always
//! absorbed by the logger; `ConfigError` belongs to configuration loading.

use thiserror::Error;

/// Validation failures raised by a log call before anything is written
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("log message must not be empty")]
    EmptyMessage,

    #[error("component name must not be empty")]
    EmptyComponent,

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("unknown context field: {0}")]
    UnknownContextField(String),

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid log document: {field} - {message}")]
    InvalidDocument { field: String, message: String },
}

/// Result alias for log calls
pub type LoggerResult<T> = Result<T, LoggerError>;

impl LoggerError {
    /// Create an invalid document error
    pub fn invalid_document(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures of a single remote append
#[derive(Error, Debug)]
pub enum RemoteStoreError {
    #[error("remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote document encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("remote store rejected append: {0}")]
    Rejected(String),
}

impl RemoteStoreError {
    /// Create an error from a non-success HTTP status
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a generic rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration: {field} - {message}")]
    Invalid { field: String, message: String },
}

/// Result alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid field error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_error_messages() {
        assert_eq!(
            LoggerError::EmptyMessage.to_string(),
            "log message must not be empty"
        );
        assert_eq!(
            LoggerError::InvalidLevel("TRACE".into()).to_string(),
            "invalid log level: TRACE"
        );
        assert!(LoggerError::invalid_document("level", "missing")
            .to_string()
            .contains("level - missing"));
    }

    #[test]
    fn test_remote_error_status() {
        let err = RemoteStoreError::status(503, "unavailable");
        assert_eq!(err.to_string(), "remote store returned 503: unavailable");
    }

    #[test]
    fn test_config_error_from_figment() {
        let err: ConfigError = figment::Error::from("bad value".to_string()).into();
        assert!(err.to_string().contains("bad value"));
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LoggerError>();
        assert_send_sync::<RemoteStoreError>();
    }
}
