//! Error types for warden-client.

use thiserror::Error;

/// Main error type for all warden transport operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// I/O error during pipe operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Connection attempt exceeded its budget.
    #[error("connection timeout - warden service may not be running")]
    ConnectTimeout,

    /// No matching response arrived within the per-call budget.
    #[error("request timeout")]
    RequestTimeout,

    /// The duplex channel closed while calls were outstanding.
    #[error("warden connection closed")]
    ConnectionClosed,

    /// The inbound stream kept balancing braces without ever decoding
    /// as a message.
    #[error("frame decoder desynchronized after buffering {0} bytes")]
    Desync(usize),
}

/// Result type alias using WardenError.
pub type Result<T> = std::result::Result<T, WardenError>;
