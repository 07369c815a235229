//! Core types for contextsync
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`Document`] and [`Snapshot`]: the shared context and a point-in-time read of it
//! - [`ConflictToken`]: the opaque version carried by every read and required by every write
//! - [`MergeKeySpec`]: which list-valued keys merge by id, and on which field
//! - [`ContextStore`]: the compare-and-swap contract a backing store must honor
//! - [`ValueEncoding`]: whether top-level values are stored as JSON or as JSON strings
//! - [`ContextError`]: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod contract;
pub mod error;
pub mod traits;
pub mod types;

pub use codec::ValueEncoding;
pub use contract::{ConflictToken, SeqNoPrimaryTerm, TokenSequence, Version};
pub use error::{ContextError, MergeKeyError, Result};
pub use traits::{CasError, Conflict, ContextStore};
pub use types::{Document, MergeKeySpec, Snapshot};
