//! Storage layer for contextsync
//!
//! This crate provides in-process implementations of the
//! [`ContextStore`](contextsync_core::ContextStore) contract:
//! - MemoryStore: single document + token behind a mutex
//! - VersionedMemoryStore: integer version counter tokens
//! - SeqNoMemoryStore: sequence-number/primary-term tokens, with failover
//! - StoreStats: read/commit/conflict counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::{MemoryStore, SeqNoMemoryStore, StoreStats, VersionedMemoryStore};
