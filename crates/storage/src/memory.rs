//! In-memory context store
//!
//! Holds one document and its conflict token behind a mutex. The check of the
//! presented token and the swap happen under the same lock, so exactly one
//! writer can win with a given token.
//!
//! # Design
//!
//! - `parking_lot::Mutex`: short critical sections, no poisoning
//! - Atomic counters for reads/commits/conflicts, readable without the lock
//! - Generic over the token form so both counter and seq_no/term stores
//!   share one implementation
//!
//! # Example
//!
//! ```
//! use contextsync_core::{ContextStore, Version};
//! use contextsync_storage::VersionedMemoryStore;
//!
//! let store = VersionedMemoryStore::new();
//! let snapshot = store.read().unwrap();
//! assert_eq!(snapshot.token, Version(0));
//!
//! let next = store.compare_and_swap(snapshot.document, &snapshot.token).unwrap();
//! assert_eq!(next, Version(1));
//! ```

use contextsync_core::{
    CasError, Conflict, ContextError, ContextStore, Document, SeqNoPrimaryTerm, Snapshot,
    TokenSequence, Version,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Access counters of a [`MemoryStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Successful reads
    pub reads: u64,
    /// Successful compare-and-swaps
    pub commits: u64,
    /// Compare-and-swaps rejected for a stale token
    pub conflicts: u64,
}

impl StoreStats {
    /// Total compare-and-swap attempts that reached the token check
    pub fn commit_attempts(&self) -> u64 {
        self.commits + self.conflicts
    }
}

#[derive(Debug)]
struct Slot<T> {
    document: Document,
    token: T,
}

/// Single-document store with compare-and-swap writes
#[derive(Debug)]
pub struct MemoryStore<T> {
    slot: Mutex<Slot<T>>,
    available: AtomicBool,
    reads: AtomicU64,
    commits: AtomicU64,
    conflicts: AtomicU64,
}

/// Store using an integer version counter
pub type VersionedMemoryStore = MemoryStore<Version>;

/// Store using sequence-number/primary-term tokens
pub type SeqNoMemoryStore = MemoryStore<SeqNoPrimaryTerm>;

impl<T: TokenSequence> MemoryStore<T> {
    /// Create a store holding an empty document
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Create a store seeded with `document` under the initial token
    pub fn with_document(document: Document) -> Self {
        Self::with_token(document, T::initial())
    }

    /// Create a store seeded with `document` under an existing token
    pub fn with_token(document: Document, token: T) -> Self {
        Self {
            slot: Mutex::new(Slot { document, token }),
            available: AtomicBool::new(true),
            reads: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// Current token, without counting as a read
    pub fn current_token(&self) -> T {
        self.slot.lock().token.clone()
    }

    /// Current document, without counting as a read
    pub fn document(&self) -> Document {
        self.slot.lock().document.clone()
    }

    /// Toggle simulated reachability
    ///
    /// While unavailable, reads fail with `StoreUnavailable` and writes with
    /// `CasError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Snapshot of the access counters
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.reads.load(Ordering::Acquire),
            commits: self.commits.load(Ordering::Acquire),
            conflicts: self.conflicts.load(Ordering::Acquire),
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

impl SeqNoMemoryStore {
    /// Simulate a primary failover
    ///
    /// The primary term moves forward, so every token handed out before this
    /// call is stale even though the content did not change.
    pub fn promote_primary(&self) -> SeqNoPrimaryTerm {
        let mut slot = self.slot.lock();
        slot.token = slot.token.next_term();
        tracing::debug!(token = %slot.token, "primary promoted");
        slot.token
    }
}

impl<T: TokenSequence> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TokenSequence> ContextStore for MemoryStore<T> {
    type Token = T;

    fn read(&self) -> Result<Snapshot<T>, ContextError> {
        if !self.is_available() {
            return Err(ContextError::StoreUnavailable(
                "memory store marked unavailable".into(),
            ));
        }
        let slot = self.slot.lock();
        self.reads.fetch_add(1, Ordering::AcqRel);
        Ok(Snapshot::new(slot.document.clone(), slot.token.clone()))
    }

    fn compare_and_swap(&self, document: Document, expected: &T) -> Result<T, CasError<T>> {
        if !self.is_available() {
            return Err(CasError::Unavailable("memory store marked unavailable".into()));
        }
        let mut slot = self.slot.lock();
        if slot.token != *expected {
            self.conflicts.fetch_add(1, Ordering::AcqRel);
            return Err(CasError::Conflict(Conflict::new(
                expected.clone(),
                slot.token.clone(),
            )));
        }
        let Some(next) = slot.token.advance() else {
            return Err(CasError::Unavailable(format!(
                "token space exhausted at {}",
                slot.token
            )));
        };
        slot.document = document;
        slot.token = next.clone();
        self.commits.fetch_add(1, Ordering::AcqRel);
        Ok(next)
    }
}
