//! Error types and handling for relay streams.
//!
//! Every failure a relay can observe surfaces as a single [`RelayError`]
//! item on the stream (or a single rejection from the bridging helpers).

use std::fmt;

/// Main error type for relay operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelayError {
    /// A transform invocation failed
    #[error("transform failed: {0}")]
    Transform(String),
    /// The end-of-stream hook failed
    #[error("end hook failed: {0}")]
    EndHook(String),
    /// The source stream produced an error
    #[error("upstream error: {0}")]
    Upstream(String),
    /// The destination sink refused a write or failed to close
    #[error("destination error: {0}")]
    Destination(String),
    /// Custom error with message
    #[error("relay error: {0}")]
    Custom(String),
}

impl RelayError {
    pub fn transform(err: impl fmt::Display) -> Self {
        RelayError::Transform(err.to_string())
    }

    pub fn end_hook(err: impl fmt::Display) -> Self {
        RelayError::EndHook(err.to_string())
    }

    pub fn upstream(err: impl fmt::Display) -> Self {
        RelayError::Upstream(err.to_string())
    }

    pub fn destination(err: impl fmt::Display) -> Self {
        RelayError::Destination(err.to_string())
    }

    pub fn custom(err: impl fmt::Display) -> Self {
        RelayError::Custom(err.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Upstream(err.to_string())
    }
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
