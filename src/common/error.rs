//! Error types shared across the crate.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WalletMonitorError>;

/// Top-level error type for transport, scanning and monitoring failures.
#[derive(Error, Debug)]
pub enum WalletMonitorError {
    /// The provider answered with a rate-limit status.
    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    /// The provider rejected the credentials. Never retried.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// Connection, TLS or timeout failure below the JSON-RPC layer.
    #[error("network error: {0}")]
    Network(String),

    /// The retry budget for a single call ran out.
    #[error("{method} failed after {attempts} attempts")]
    MaxRetriesExceeded {
        method: String,
        attempts: u32,
        #[source]
        source: Box<WalletMonitorError>,
    },

    /// The provider returned a JSON-RPC `error` member.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// WebSocket connect, handshake or protocol failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A monitor already exists for the requested subscription key.
    #[error("already monitoring {0}")]
    AlreadyMonitored(String),

    /// Catch-all for invariant violations inside the crate.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WalletMonitorError {
    /// True for credential failures, which callers must never retry.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, WalletMonitorError::AuthFailure(_))
    }
}
