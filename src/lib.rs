//! # contextsync
//!
//! Optimistic-concurrency merge updates for a shared, versioned JSON context.
//!
//! Several independent writers keep state (tracked mirrors, pending
//! questions, known users...) in one JSON document held by an external
//! store. The store can only swap the whole document against a conflict
//! token. contextsync turns partial updates into safe whole-document writes:
//! read, merge by id, compare-and-swap, and on conflict re-read and try
//! again, up to a fixed number of attempts.
//!
//! ## Quick Start
//!
//! ```
//! use contextsync::prelude::*;
//!
//! let context = VersionedContextStore::builder()
//!     .merge_key("users", "id")
//!     .build(VersionedMemoryStore::new())?;
//!
//! context.update(json!({"users": [{"id": 1, "name": "a"}]}).as_object().unwrap())?;
//! context.update(json!({"users": [{"id": 2, "name": "b"}]}).as_object().unwrap())?;
//!
//! let users: Vec<serde_json::Value> = context.get("users")?.unwrap_or_default();
//! assert_eq!(users.len(), 2);
//! # Ok::<(), contextsync::Error>(())
//! ```
//!
//! ## Crates
//!
//! - `contextsync-core` - documents, tokens, merge key spec, store contract
//! - `contextsync-concurrency` - pure merge and the bounded retry loop
//! - `contextsync-storage` - in-memory stores for both token forms

#![warn(missing_docs)]

mod config;
mod context;
mod error;

pub mod prelude;

// Re-export main entry points
pub use config::ContextConfig;
pub use context::{CommitReceipt, ContextStoreBuilder, VersionedContextStore};
pub use error::{Error, Result};

// Re-export building blocks
pub use contextsync_concurrency::{
    compute_merged, merge_by_id, remove_by_id, Backoff, RetryOutcome, RetryPolicy, UpdateManager,
    DEFAULT_MAX_ATTEMPTS,
};
pub use contextsync_core::{
    CasError, Conflict, ConflictToken, ContextError, ContextStore, Document, MergeKeyError,
    MergeKeySpec, SeqNoPrimaryTerm, Snapshot, TokenSequence, ValueEncoding, Version,
};
pub use contextsync_storage::{MemoryStore, SeqNoMemoryStore, StoreStats, VersionedMemoryStore};
