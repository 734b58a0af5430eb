//! Application error types with rich context

use std::time::Duration;

use thiserror::Error;

use crate::types::DataKind;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // ─────────────────────────────────────────────────────────────
    // Device RPC Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Device RPC error: {message}")]
    Rpc { message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Device {device} is unreachable")]
    Unreachable { device: String },

    // ─────────────────────────────────────────────────────────────
    // Editing Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Cache Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Cache decode error: {message}")]
    CacheDecode { message: String },

    #[error("Payload kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: DataKind, actual: DataKind },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    pub fn unreachable(device: impl Into<String>) -> Self {
        Self::Unreachable {
            device: device.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn cache_decode(message: impl Into<String>) -> Self {
        Self::CacheDecode {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Transient device failures and rejected edits never take the
    /// dashboard down; the affected panel shows them inline.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Rpc { .. }
                | Error::Timeout { .. }
                | Error::Unreachable { .. }
                | Error::Validation { .. }
                | Error::CacheDecode { .. }
                | Error::KindMismatch { .. }
                | Error::ChannelSend { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
