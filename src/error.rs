// Error types module

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed protected operation.
///
/// The breaker is transport-agnostic: callers map their own error types onto
/// these kinds, and the breaker only counts occurrences per kind for
/// observability. The kind never changes admission logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The operation hit its own deadline
    Timeout,
    /// Connection-level failure (refused, reset, DNS, ...)
    Connection,
    /// The remote answered with an error status
    Status,
    /// The caller dropped the in-flight call before it finished
    Cancelled,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Stable lowercase label, used in logs and snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Status => "status",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by a protected operation.
///
/// Carries the classification used for bookkeeping plus a human-readable
/// message for the caller. Constructors cover the common transport failures;
/// `From` impls map the usual suspects so call sites can use `?` inside the
/// protected operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CallError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Failure derived from an HTTP-style status code
    pub fn status(code: u16) -> Self {
        Self::new(ErrorKind::Status, format!("status {}", code))
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "call cancelled by caller")
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<std::io::Error> for CallError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => ErrorKind::Connection,
            _ => ErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for CallError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::timeout(err.to_string())
    }
}

/// Configuration validation errors, surfaced at setup time before any call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config: {field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("invalid config: {field} must be between 0 and 100 (got {value})")]
    OutOfRange { field: &'static str, value: u8 },
}
