//! Error types.
//!
//! Navigation itself never fails: missing geometry, out-of-range pages and
//! unknown documents are no-ops. These errors only cover configuration loading
//! and failures reported by collaborators.

use thiserror::Error;

/// Failure reported by a [`ScrollPrimitive`](crate::ScrollPrimitive).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScrollError {
    /// Scroll container is gone (workspace torn down or hidden).
    #[error("scroll container unavailable")]
    ContainerUnavailable,

    /// Any other failure raised by the host, such as a target element that
    /// is not mounted.
    #[error("scroll primitive failed: {0}")]
    Backend(String),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A value was present but could not be used.
    #[error("invalid value for configuration key {key}: {reason}")]
    InvalidValue {
        key: String,
        reason: String,
    },

    /// I/O error reading or writing a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
