//! Conflict tokens
//!
//! A conflict token is returned by every read and must be presented back on
//! every write. A write succeeds only when the presented token equals the
//! store's current token; a successful write advances it.
//!
//! ## Two Token Forms
//!
//! | Token | Backing store | Advance rule |
//! |-------|---------------|--------------|
//! | [`Version`] | Integer version counter | `n -> n + 1` |
//! | [`SeqNoPrimaryTerm`] | Replicated document index | `seq_no + 1`, term unchanged |
//!
//! Tokens are compared for equality only. Numeric ordering is not meaningful
//! across the two forms, and callers must not rely on it within a form either:
//! a primary failover resets the meaning of `seq_no` under a new term.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Opaque optimistic-concurrency token
///
/// Implementations must be cheap to clone and comparable for equality.
/// `Display` is used when reporting conflicts.
pub trait ConflictToken: Clone + Debug + Display + PartialEq + Eq + Send + Sync + 'static {}

/// A token that knows how to produce its successor
///
/// Used by stores that mint tokens themselves (the in-memory stores).
/// External stores only need [`ConflictToken`].
pub trait TokenSequence: ConflictToken {
    /// Token of a freshly created document
    fn initial() -> Self;

    /// Token that a successful write on top of `self` produces
    ///
    /// `None` once the counter is at its maximum; a store must refuse the
    /// write rather than hand out a token it already issued.
    fn advance(&self) -> Option<Self>;
}

/// Integer version counter
///
/// Starts at 0 for a freshly created document and increments by one on every
/// committed write.
///
/// # Examples
///
/// ```
/// use contextsync_core::{TokenSequence, Version};
///
/// let v = Version::initial();
/// assert_eq!(v.advance(), Some(Version(1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    /// Raw counter value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Version(v)
    }
}

impl ConflictToken for Version {}

impl TokenSequence for Version {
    fn initial() -> Self {
        Version(0)
    }

    fn advance(&self) -> Option<Self> {
        self.0.checked_add(1).map(Version)
    }
}

/// Sequence number / primary term pair
///
/// The token form of a replicated document index. `seq_no` advances on every
/// write; `primary_term` changes only when a new primary takes over, which
/// invalidates every token handed out under the old term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqNoPrimaryTerm {
    /// Per-document sequence number
    #[serde(rename = "sequenceNumber")]
    pub seq_no: u64,
    /// Term of the primary that accepted the last write
    #[serde(rename = "primaryTerm")]
    pub primary_term: u64,
}

impl SeqNoPrimaryTerm {
    /// Create a token from its parts
    pub fn new(seq_no: u64, primary_term: u64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }

    /// Same sequence number under the next primary term
    pub fn next_term(&self) -> Self {
        Self {
            seq_no: self.seq_no,
            primary_term: self.primary_term + 1,
        }
    }
}

impl Display for SeqNoPrimaryTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seq_no={}/term={}", self.seq_no, self.primary_term)
    }
}

impl ConflictToken for SeqNoPrimaryTerm {}

impl TokenSequence for SeqNoPrimaryTerm {
    fn initial() -> Self {
        SeqNoPrimaryTerm::new(0, 1)
    }

    fn advance(&self) -> Option<Self> {
        let seq_no = self.seq_no.checked_add(1)?;
        Some(SeqNoPrimaryTerm::new(seq_no, self.primary_term))
    }
}
