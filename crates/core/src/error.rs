//! Error types for contextsync
//!
//! Conflicts are deliberately absent from [`ContextError`]: a stale token is a
//! routine signal consumed by the retry loop (see [`crate::CasError`]). What
//! reaches a caller is either a hard store failure, exhaustion of the retry
//! budget, or an update that was rejected before any I/O.

use thiserror::Error;

/// Errors surfaced by context operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The backing store could not be reached or failed with a non-conflict error
    #[error("context store unavailable: {0}")]
    StoreUnavailable(String),

    /// Every attempt lost the race to another writer
    #[error("context update exhausted after {attempts} attempts (last conflict: {last_conflict})")]
    ContextUpdateExhausted {
        /// Number of commit attempts made
        attempts: u32,
        /// Rendering of the last conflict observed
        last_conflict: String,
    },

    /// An update could not be applied under the merge key spec
    #[error(transparent)]
    MergeKey(#[from] MergeKeyError),

    /// A value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration rejected before use
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Rejection of an update against a [`crate::MergeKeySpec`]
///
/// Raised before the store is touched; no partial merge is ever applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeKeyError {
    /// An entry in a merge-by-id list has no usable id
    #[error("entry {index} of '{key}' is missing id field '{field}'")]
    MissingId {
        /// Top-level document key
        key: String,
        /// Declared id field
        field: String,
        /// Position of the offending entry in the update list
        index: usize,
    },

    /// An entry in a merge-by-id list is not a JSON object
    #[error("entry {index} of '{key}' is not an object")]
    NotAnObject {
        /// Top-level document key
        key: String,
        /// Position of the offending entry in the update list
        index: usize,
    },

    /// An id-based operation named a key with no declared id field
    #[error("no merge key declared for '{key}'")]
    Undeclared {
        /// Top-level document key
        key: String,
    },
}

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

impl ContextError {
    /// Check if the store was unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ContextError::StoreUnavailable(_))
    }

    /// Check if the retry budget ran out
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ContextError::ContextUpdateExhausted { .. })
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(e: serde_json::Error) -> Self {
        ContextError::Serialization(e.to_string())
    }
}
