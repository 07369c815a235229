//! Unified error types for contextsync.
//!
//! This module provides a clean error type that wraps internal errors
//! and presents a consistent interface to users.

use contextsync_core::{ContextError, MergeKeyError};
use thiserror::Error;

/// All contextsync errors.
///
/// This is the canonical error type for all public operations. Conflicts
/// never appear here: they are absorbed by the retry loop, and only their
/// exhaustion surfaces.
#[derive(Debug, Error)]
pub enum Error {
    /// Backing store unreachable or failed with a non-conflict error
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Every attempt lost to a concurrent writer
    #[error("context update exhausted after {attempts} attempts: {last_conflict}")]
    ContextUpdateExhausted {
        /// Commit attempts made
        attempts: u32,
        /// Last conflict observed
        last_conflict: String,
    },

    /// Update rejected against the merge key spec, before any I/O
    #[error("merge key error: {0}")]
    MergeKey(#[from] MergeKeyError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration failed to parse or validate
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for contextsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if retrying the whole operation later may help.
    ///
    /// True for exhaustion (contention may subside) and store unavailability
    /// (the store may come back). Neither is retried inside this crate.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ContextUpdateExhausted { .. } | Error::StoreUnavailable(_)
        )
    }

    /// Check if this is an exhaustion error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::ContextUpdateExhausted { .. })
    }

    /// Check if the store was unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }

    /// Check if the update was rejected by the merge key spec.
    pub fn is_merge_key(&self) -> bool {
        matches!(self, Error::MergeKey(_))
    }
}

// Convert from internal core errors
impl From<ContextError> for Error {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::StoreUnavailable(msg) => Error::StoreUnavailable(msg),
            ContextError::ContextUpdateExhausted {
                attempts,
                last_conflict,
            } => Error::ContextUpdateExhausted {
                attempts,
                last_conflict,
            },
            ContextError::MergeKey(e) => Error::MergeKey(e),
            ContextError::Serialization(msg) => Error::Serialization(msg),
            ContextError::InvalidConfig(msg) => Error::Config(msg),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Convert from TOML parse errors
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
