//! Error types for client pool operations.

use thiserror::Error;

/// Errors produced by client pool components.
#[derive(Debug, Error)]
pub enum ClientPoolError {
    /// Pool configuration was rejected before start.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A client failed to start.
    #[error("client {priority} failed to start: {reason}")]
    ClientStart {
        /// Priority partition of the client.
        priority: i32,
        /// Underlying failure.
        reason: String,
    },
    /// A client failed to stop.
    #[error("client {priority} failed to stop: {reason}")]
    ClientStop {
        /// Priority partition of the client.
        priority: i32,
        /// Underlying failure.
        reason: String,
    },
    /// A reset loop was interrupted by pool shutdown.
    #[error("reset of client {priority} cancelled after {attempts} attempts")]
    ResetCancelled {
        /// Priority partition of the client.
        priority: i32,
        /// Reconnect attempts made before cancellation.
        attempts: u32,
    },
    /// No client is registered for the priority and no default exists.
    #[error("no client for priority {0}")]
    ClientNotFound(i32),
    /// Fabric adapter failure with context.
    #[error("fabric error: {0}")]
    Fabric(String),
}

/// Application-facing result using anyhow; fabric adapters return this.
pub type AppResult<T> = Result<T, anyhow::Error>;
