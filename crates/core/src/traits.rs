//! Store contract
//!
//! A [`ContextStore`] is the only shared mutable resource this library deals
//! with. It offers exactly two operations: read the whole document with its
//! token, and compare-and-swap the whole document against a token. There are
//! no partial-field writes and no transactions.

use crate::contract::ConflictToken;
use crate::error::ContextError;
use crate::types::{Document, Snapshot};
use std::fmt;
use std::sync::Arc;

/// A stale-token rejection from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict<T> {
    /// Token the writer presented
    pub presented: T,
    /// Token the store held at write time, when the store reports it
    pub current: Option<T>,
}

impl<T> Conflict<T> {
    /// Conflict where the store reported its current token
    pub fn new(presented: T, current: T) -> Self {
        Self {
            presented,
            current: Some(current),
        }
    }

    /// Conflict where the store did not say what it holds
    pub fn opaque(presented: T) -> Self {
        Self {
            presented,
            current: None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Conflict<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current {
            Some(current) => write!(f, "presented {}, store at {}", self.presented, current),
            None => write!(f, "presented {}, store token moved", self.presented),
        }
    }
}

/// Failure of a compare-and-swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasError<T> {
    /// Another writer committed first; re-read and retry
    Conflict(Conflict<T>),
    /// The store failed for a reason other than a stale token
    Unavailable(String),
}

/// Versioned document store with compare-and-swap writes
///
/// # Contract
///
/// - `read` has no side effects.
/// - `compare_and_swap` succeeds only if `expected` equals the store's
///   current token, in which case document and token are replaced atomically
///   and the new token is returned.
/// - Exactly one writer can succeed with a given token.
pub trait ContextStore {
    /// Conflict token type of this store
    type Token: ConflictToken;

    /// Read the current document and token
    ///
    /// Fails with [`ContextError::StoreUnavailable`] if the store can't be reached.
    fn read(&self) -> Result<Snapshot<Self::Token>, ContextError>;

    /// Replace the document if `expected` is still current
    fn compare_and_swap(
        &self,
        document: Document,
        expected: &Self::Token,
    ) -> Result<Self::Token, CasError<Self::Token>>;
}

impl<S: ContextStore + ?Sized> ContextStore for &S {
    type Token = S::Token;

    fn read(&self) -> Result<Snapshot<Self::Token>, ContextError> {
        (**self).read()
    }

    fn compare_and_swap(
        &self,
        document: Document,
        expected: &Self::Token,
    ) -> Result<Self::Token, CasError<Self::Token>> {
        (**self).compare_and_swap(document, expected)
    }
}

impl<S: ContextStore + ?Sized> ContextStore for Arc<S> {
    type Token = S::Token;

    fn read(&self) -> Result<Snapshot<Self::Token>, ContextError> {
        (**self).read()
    }

    fn compare_and_swap(
        &self,
        document: Document,
        expected: &Self::Token,
    ) -> Result<Self::Token, CasError<Self::Token>> {
        (**self).compare_and_swap(document, expected)
    }
}
