//! Concurrency layer for contextsync
//!
//! This crate implements the optimistic update protocol:
//! - Pure client-side merge of partial updates (merge by id, replace otherwise)
//! - Explicit removal of list entries by id
//! - Bounded read-merge-commit loop with conflict detection at commit time
//! - Retry budget and backoff between attempts

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod merge;
pub mod policy;

pub use manager::{exhausted, RetryOutcome, UpdateManager};
pub use merge::{compute_merged, merge_by_id, remove_by_id, validate_updates};
pub use policy::{Backoff, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
