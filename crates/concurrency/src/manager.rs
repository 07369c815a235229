//! Update manager: bounded read-merge-commit
//!
//! Drives one logical update to completion against a [`ContextStore`].
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. read()               - fresh document + token, every attempt
//! 2. decode               - per the configured ValueEncoding
//! 3. mutate(document)     - pure, may run once per attempt
//! 4. encode               - only keys the mutation changed
//! 5. compare_and_swap()   - atomic on whole document + token
//! 6. IF conflict AND attempts left: back off, goto 1
//! 7. IF conflict AND budget spent: Exhausted
//! 8. IF committed: Committed(new token)
//! ```
//!
//! Store failures (read or write) end the update immediately; they are not
//! retried here. A caller that wants to retry an unreachable store does so
//! at a higher level.
//!
//! ## Purity Requirement
//!
//! The mutation closure may be called several times. It must depend only on
//! the document it is handed and must not perform I/O.

use crate::merge::{compute_merged, remove_by_id, validate_updates};
use crate::policy::RetryPolicy;
use contextsync_core::{
    CasError, Conflict, ContextError, ContextStore, Document, MergeKeyError, MergeKeySpec, Result,
    ValueEncoding,
};
use serde_json::Value;

/// How an update ended
///
/// Exhaustion is a normal return value here; the facade turns it into
/// [`ContextError::ContextUpdateExhausted`].
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    /// A commit went through
    Committed {
        /// Token produced by the winning commit
        token: T,
        /// Attempts it took, including the winning one
        attempts: u32,
        /// Document as committed, in decoded form
        document: Document,
    },
    /// Every attempt conflicted
    Exhausted {
        /// Attempts made (always the full budget)
        attempts: u32,
        /// Conflict observed on the last attempt
        last_conflict: Conflict<T>,
    },
}

impl<T: std::fmt::Display> RetryOutcome<T> {
    /// Token of a committed update, or the exhaustion error
    pub fn into_token(self) -> Result<T> {
        match self {
            RetryOutcome::Committed { token, .. } => Ok(token),
            RetryOutcome::Exhausted {
                attempts,
                last_conflict,
            } => Err(exhausted(attempts, &last_conflict)),
        }
    }

    /// Whether a commit went through
    pub fn is_committed(&self) -> bool {
        matches!(self, RetryOutcome::Committed { .. })
    }

    /// Attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Committed { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Build the caller-facing exhaustion error
pub fn exhausted<T: std::fmt::Display>(attempts: u32, last_conflict: &Conflict<T>) -> ContextError {
    ContextError::ContextUpdateExhausted {
        attempts,
        last_conflict: last_conflict.to_string(),
    }
}

/// Runs updates under a [`RetryPolicy`]
///
/// Stateless apart from its settings: it never holds on to a document
/// between calls, so one manager can serve any number of stores and threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateManager {
    policy: RetryPolicy,
    encoding: ValueEncoding,
}

impl UpdateManager {
    /// Create a manager, rejecting an unusable policy
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            encoding: ValueEncoding::Native,
        })
    }

    /// Set how top-level values are stored
    pub fn with_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The policy in force
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The value encoding in force
    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    /// Generic read-modify-commit with bounded retries
    ///
    /// `mutate` receives the freshly read document (decoded) and returns the
    /// document to commit. An error from `mutate` aborts the update before
    /// the commit of that attempt and is returned as is.
    pub fn transition<S, F, E>(
        &self,
        store: &S,
        mut mutate: F,
    ) -> std::result::Result<RetryOutcome<S::Token>, E>
    where
        S: ContextStore + ?Sized,
        F: FnMut(Document) -> std::result::Result<Document, E>,
        E: From<ContextError>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let (stored, token) = store.read()?.into_parts();
            let next = mutate(self.encoding.decode(&stored))?;
            let encoded = self.encoding.encode(&stored, next.clone())?;

            match store.compare_and_swap(encoded, &token) {
                Ok(committed) => {
                    tracing::debug!(
                        attempt,
                        token = %committed,
                        "context update committed"
                    );
                    return Ok(RetryOutcome::Committed {
                        token: committed,
                        attempts: attempt,
                        document: next,
                    });
                }
                Err(CasError::Conflict(conflict)) => {
                    if attempt >= max_attempts {
                        tracing::warn!(
                            attempts = attempt,
                            conflict = %conflict,
                            "context update exhausted retry budget"
                        );
                        return Ok(RetryOutcome::Exhausted {
                            attempts: attempt,
                            last_conflict: conflict,
                        });
                    }
                    tracing::debug!(
                        attempt,
                        max_attempts,
                        conflict = %conflict,
                        "context commit conflicted, re-reading"
                    );
                    let pause = self.policy.backoff.delay();
                    if !pause.is_zero() {
                        std::thread::sleep(pause);
                    }
                }
                Err(CasError::Unavailable(msg)) => {
                    return Err(ContextError::StoreUnavailable(msg).into());
                }
            }
        }
    }

    /// Merge `updates` into the shared document
    ///
    /// Updates are validated against `spec` once, before the store is read.
    pub fn set_with_retry<S>(
        &self,
        store: &S,
        updates: &Document,
        spec: &MergeKeySpec,
    ) -> Result<RetryOutcome<S::Token>>
    where
        S: ContextStore + ?Sized,
    {
        validate_updates(updates, spec)?;
        self.transition(store, |current| {
            compute_merged(&current, updates, spec).map_err(ContextError::from)
        })
    }

    /// Remove entries with the given ids from a merge-by-id list
    ///
    /// `key` must be declared in `spec`. Ids not present are ignored.
    pub fn remove_with_retry<S>(
        &self,
        store: &S,
        key: &str,
        ids: &[Value],
        spec: &MergeKeySpec,
    ) -> Result<RetryOutcome<S::Token>>
    where
        S: ContextStore + ?Sized,
    {
        let field = spec
            .id_field(key)
            .ok_or_else(|| MergeKeyError::Undeclared {
                key: key.to_string(),
            })?;
        self.transition(store, |current| Ok(remove_by_id(&current, key, field, ids)))
    }
}

impl Default for UpdateManager {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            encoding: ValueEncoding::Native,
        }
    }
}
