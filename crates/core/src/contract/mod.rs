//! Contract types
//!
//! Types that define what a read hands out and what a write must present back.

pub mod token;

pub use token::{ConflictToken, SeqNoPrimaryTerm, TokenSequence, Version};
