//! error.rs - Error types for the stock watcher

use thiserror::Error;

/// Unified error type for watcher operations
#[derive(Debug, Error)]
pub enum WatchError {
    /// Retailer answered with a non-success status for a variant
    #[error("fetch failed for {key}: HTTP {status}")]
    FetchStatus { key: String, status: u16 },

    /// Retailer body could not be split into the expected fields
    #[error("malformed retailer response {body:?}: {reason}")]
    MalformedResponse { body: String, reason: String },

    /// Rate feed answered but the requested rate was missing or not a number
    #[error("exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// Network error, timeout or unexpected transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot key that is not `<sir>|<size>|<color>`
    #[error("invalid variant key: {0}")]
    InvalidKey(String),

    /// Webhook endpoint rejected the payload
    #[error("webhook rejected payload: HTTP {status}: {body}")]
    Webhook { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
