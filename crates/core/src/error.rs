// SPDX-License-Identifier: MIT

//! Error taxonomy and classifier: every Target/Source failure is routed
//! through a small set of HTTP/exception classification tables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of four error kinds every Target/Source failure is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Retryable; does not necessarily indicate Target distress.
    Transient,
    /// Not retryable; routed straight to the DLQ.
    Permanent,
    /// Retryable with a longer ladder — the item may surface later after
    /// a library scan.
    NotFound,
    /// Retryable; counts against the circuit breaker.
    ServerDown,
}

/// A classified sync error, carrying enough context for DLQ rows and logs.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transient error: {message}")]
    Transient { message: String, #[source] source: Option<Box<dyn std::error::Error + Send + Sync>> },
    #[error("permanent error: {message}")]
    Permanent { message: String, #[source] source: Option<Box<dyn std::error::Error + Send + Sync>> },
    #[error("not found: {message}")]
    NotFound { message: String, #[source] source: Option<Box<dyn std::error::Error + Send + Sync>> },
    #[error("target server down: {message}")]
    ServerDown { message: String, #[source] source: Option<Box<dyn std::error::Error + Send + Sync>> },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Transient { .. } => ErrorKind::Transient,
            SyncError::Permanent { .. } => ErrorKind::Permanent,
            SyncError::NotFound { .. } => ErrorKind::NotFound,
            SyncError::ServerDown { .. } => ErrorKind::ServerDown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SyncError::Transient { message, .. }
            | SyncError::Permanent { message, .. }
            | SyncError::NotFound { message, .. }
            | SyncError::ServerDown { message, .. } => message,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        SyncError::Permanent { message: message.into(), source: None }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        SyncError::Transient { message: message.into(), source: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SyncError::NotFound { message: message.into(), source: None }
    }
}

/// Classify an HTTP status code into a retry-relevant error kind.
pub fn classify_http(status: u16) -> ErrorKind {
    match status {
        429 | 500 | 502 | 503 | 504 => ErrorKind::Transient,
        400 | 401 | 403 | 404 | 405 | 410 | 422 => ErrorKind::Permanent,
        400..=499 => ErrorKind::Permanent,
        500..=599 => ErrorKind::Transient,
        _ => ErrorKind::Transient,
    }
}

/// Coarse exception shape used by `classify_exception` — deliberately not
/// a 1:1 mirror of any single HTTP/IO error type, since the classifier
/// must work uniformly over Source and Target client errors alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionShape {
    ConnectionOrTimeout,
    Os,
    Validation,
    Type,
    AlreadyClassified(ErrorKind),
    Other,
}

/// Classify a non-HTTP exception. Unknown inputs default to `Transient`
/// — safer than DLQing a novel error.
pub fn classify_exception(shape: ExceptionShape) -> ErrorKind {
    match shape {
        ExceptionShape::ConnectionOrTimeout | ExceptionShape::Os => ErrorKind::Transient,
        ExceptionShape::Validation | ExceptionShape::Type => ErrorKind::Permanent,
        ExceptionShape::AlreadyClassified(kind) => kind,
        ExceptionShape::Other => ErrorKind::Transient,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
