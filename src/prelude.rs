//! Convenient imports for contextsync.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```
//! use contextsync::prelude::*;
//!
//! let context = VersionedContextStore::new(VersionedMemoryStore::new());
//! let (document, version) = context.fetch_latest()?;
//! assert!(document.is_empty());
//! assert_eq!(version, Version(0));
//! # Ok::<(), contextsync::Error>(())
//! ```

// Main entry point
pub use crate::context::{CommitReceipt, ContextStoreBuilder, VersionedContextStore};
pub use crate::config::ContextConfig;

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use contextsync_core::{
    ContextStore, Document, MergeKeySpec, SeqNoPrimaryTerm, ValueEncoding, Version,
};

// Retry settings
pub use contextsync_concurrency::{Backoff, RetryPolicy};

// Stores
pub use contextsync_storage::{SeqNoMemoryStore, VersionedMemoryStore};

// Re-export serde_json for convenience
pub use serde_json::json;
