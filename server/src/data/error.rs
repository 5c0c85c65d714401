//! Error type for the tracing backend layer

use thiserror::Error;

/// Errors returned while fetching spans from a tracing backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Trace does not exist in the backend
    #[error("Trace not found: {0}")]
    NotFound(String),

    /// Backend answered with a non-success status
    #[error("Backend {backend} returned HTTP {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failure (connect, timeout, TLS)
    #[error("Request to tracing backend failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body is not a recognizable span list
    #[error("Failed to decode spans: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid time range
    #[error("Invalid time range: from {from_ms} is after to {to_ms}")]
    InvalidRange { from_ms: i64, to_ms: i64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// True for failures the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
