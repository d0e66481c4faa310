// src/error.rs

//! Unified error handling for the collector.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable classification of an [`AppError`].
///
/// Stage markers attached to a snapshot carry this instead of the error
/// itself, so they can be compared and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    QuotaExceeded,
    TransientTransport,
    MalformedData,
    PreconditionMissing,
    InvalidIdentifier,
    Api,
    Storage,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::TransientTransport => "transient_network",
            ErrorKind::MalformedData => "malformed_data",
            ErrorKind::PreconditionMissing => "precondition_missing",
            ErrorKind::InvalidIdentifier => "invalid_identifier",
            ErrorKind::Api => "api_error",
            ErrorKind::Storage => "storage",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The id does not resolve to a remote entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// A quota reservation was refused
    #[error("Quota exceeded for {operation}: needs {cost} units, {remaining} remaining")]
    QuotaExceeded {
        operation: String,
        cost: u64,
        remaining: u64,
    },

    /// Network or 5xx-class failure worth retrying
    #[error("Transient transport error: {0}")]
    Transient(String),

    /// Non-retryable error reported by the remote API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A stage was requested without its required input
    #[error("Missing precondition: {0}")]
    PreconditionMissing(String),

    /// The identifier is not a channel id or channel URL
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a quota error.
    pub fn quota_exceeded(operation: impl Into<String>, cost: u64, remaining: u64) -> Self {
        Self::QuotaExceeded {
            operation: operation.into(),
            cost,
            remaining,
        }
    }

    /// Create a transient transport error.
    pub fn transient(message: impl fmt::Display) -> Self {
        Self::Transient(message.to_string())
    }

    /// Create a remote API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a missing-precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionMissing(message.into())
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier(id.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            AppError::Transient(_) => ErrorKind::TransientTransport,
            AppError::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                ErrorKind::TransientTransport
            }
            AppError::Http(_) | AppError::Api { .. } => ErrorKind::Api,
            AppError::Json(_) => ErrorKind::MalformedData,
            AppError::PreconditionMissing(_) => ErrorKind::PreconditionMissing,
            AppError::InvalidIdentifier(_) | AppError::Url(_) => ErrorKind::InvalidIdentifier,
            AppError::Io(_) | AppError::Storage(_) => ErrorKind::Storage,
            AppError::Toml(_) | AppError::Config(_) | AppError::Validation(_) => {
                ErrorKind::Config
            }
        }
    }

    /// Whether a retry with backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientTransport
    }
}
