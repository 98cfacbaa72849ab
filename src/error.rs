//! Error types for Thought Seal

use thiserror::Error;

/// Storage backend error
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Local state file error
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sealing workflow error
#[derive(Debug, Error)]
pub enum SealError {
    /// Client identity has not been resolved yet
    #[error("client identity not ready")]
    NotReady,

    /// Locked client already owns the free number of thoughts
    #[error("free limit of {limit} thoughts reached")]
    QuotaExceeded { limit: u64 },

    /// Input rejected before any write
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store could not count or insert
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// License verification error
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key was empty after trimming; no registry call was made
    #[error("license key is empty")]
    EmptyKey,

    /// Registry rejected the key, or the purchase was refunded
    #[error("license key is not valid")]
    Invalid,

    /// Registry unreachable or answered with something unreadable
    #[error("license registry unavailable: {0}")]
    Transient(String),

    /// The unlock could not be persisted locally
    #[error("could not persist unlock state: {0}")]
    State(#[from] StateError),
}

impl From<reqwest::Error> for LicenseError {
    fn from(err: reqwest::Error) -> Self {
        LicenseError::Transient(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
