//! Versioned context store, the main entry point.
//!
//! `VersionedContextStore` applies partial updates to a shared JSON document
//! held by an external store, without losing concurrent writers' changes.
//! Every update is read-merge-commit against a fresh read, retried on
//! conflict up to a fixed number of attempts.

use crate::config::ContextConfig;
use crate::error::Result;
use contextsync_concurrency::{exhausted, Backoff, RetryOutcome, RetryPolicy, UpdateManager};
use contextsync_core::{ContextStore, Document, MergeKeySpec, ValueEncoding};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Result of a committed update.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt<T> {
    /// Token produced by the commit
    pub token: T,
    /// Attempts it took, including the winning one
    pub attempts: u32,
    /// Document as committed, decoded
    pub document: Document,
}

/// Optimistic-concurrency merge updates over a [`ContextStore`].
///
/// The store is injected at construction; nothing is looked up globally.
/// The document is never cached: every operation starts from a fresh read.
///
/// # Example
///
/// ```
/// use contextsync::prelude::*;
///
/// let context = VersionedContextStore::builder()
///     .merge_key("mirrors", "investigation_id")
///     .max_attempts(3)
///     .build(VersionedMemoryStore::new())?;
///
/// let update = json!({"mirrors": [{"investigation_id": "999", "mirrored": false}]});
/// let version = context.update(update.as_object().unwrap())?;
/// assert_eq!(version, Version(1));
/// # Ok::<(), contextsync::Error>(())
/// ```
pub struct VersionedContextStore<S> {
    store: S,
    merge_keys: MergeKeySpec,
    manager: UpdateManager,
}

impl VersionedContextStore<()> {
    /// Create a builder.
    ///
    /// The store type is fixed by [`ContextStoreBuilder::build`].
    pub fn builder() -> ContextStoreBuilder {
        ContextStoreBuilder::new()
    }
}

impl<S: ContextStore> VersionedContextStore<S> {
    /// Wrap a store with default settings.
    ///
    /// Three attempts, no backoff, native encoding, no merge keys.
    pub fn new(store: S) -> Self {
        Self {
            store,
            merge_keys: MergeKeySpec::new(),
            manager: UpdateManager::default(),
        }
    }

    /// Wrap a store with settings from a config.
    pub fn from_config(store: S, config: &ContextConfig) -> Result<Self> {
        config.validate()?;
        let manager =
            UpdateManager::new(config.retry_policy())?.with_encoding(config.value_encoding);
        tracing::debug!(
            max_attempts = config.max_attempts,
            encoding = ?config.value_encoding,
            merge_keys = config.merge_keys.len(),
            "context store configured"
        );
        Ok(Self {
            store,
            merge_keys: config.merge_keys.clone(),
            manager,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configured merge keys.
    pub fn merge_keys(&self) -> &MergeKeySpec {
        &self.merge_keys
    }

    /// The configured retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.manager.policy()
    }

    /// The configured value encoding.
    pub fn value_encoding(&self) -> ValueEncoding {
        self.manager.encoding()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the current document and its conflict token.
    ///
    /// No side effects. Values are decoded when the store keeps them as
    /// JSON strings.
    pub fn fetch_latest(&self) -> Result<(Document, S::Token)> {
        let (stored, token) = self.store.read()?.into_parts();
        Ok((self.manager.encoding().decode(&stored), token))
    }

    /// Read one top-level key and deserialize it.
    ///
    /// Returns `None` if the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let (document, _) = self.fetch_latest()?;
        match document.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Pure merge
    // =========================================================================

    /// Merge `updates` into `current` under the configured merge keys.
    ///
    /// Pure: no I/O. Fails if an update entry under a merge key has no id.
    pub fn compute_merged(&self, current: &Document, updates: &Document) -> Result<Document> {
        Ok(contextsync_concurrency::compute_merged(
            current,
            updates,
            &self.merge_keys,
        )?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Merge `updates` with an explicit merge key spec and attempt budget.
    ///
    /// Returns the token of the winning commit. Fails with
    /// [`Error::ContextUpdateExhausted`](crate::Error::ContextUpdateExhausted)
    /// after `max_attempts` conflicting commits, and with
    /// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) as soon as
    /// the store fails. Backoff and encoding come from this store's settings.
    pub fn set_with_retry(
        &self,
        updates: &Document,
        merge_key_spec: &MergeKeySpec,
        max_attempts: u32,
    ) -> Result<S::Token> {
        let policy = RetryPolicy::new(max_attempts).with_backoff(self.retry_policy().backoff);
        let manager = UpdateManager::new(policy)?.with_encoding(self.manager.encoding());
        let outcome = manager.set_with_retry(&self.store, updates, merge_key_spec)?;
        Ok(outcome.into_token()?)
    }

    /// Merge `updates` using the configured merge keys and retry policy.
    pub fn update(&self, updates: &Document) -> Result<S::Token> {
        Ok(self.update_with_outcome(updates)?.token)
    }

    /// Like [`update`](Self::update), also returning the committed document.
    pub fn update_with_outcome(&self, updates: &Document) -> Result<CommitReceipt<S::Token>> {
        let outcome = self
            .manager
            .set_with_retry(&self.store, updates, &self.merge_keys)?;
        receipt(outcome)
    }

    /// Remove list entries by id under a merge key.
    ///
    /// This is the only way entries leave a merge-by-id list. Ids that are
    /// not present are ignored. Fails if `key` has no declared merge key.
    pub fn remove_entries(&self, key: &str, ids: &[Value]) -> Result<S::Token> {
        let outcome = self
            .manager
            .remove_with_retry(&self.store, key, ids, &self.merge_keys)?;
        Ok(receipt(outcome)?.token)
    }

    /// Arbitrary read-modify-commit.
    ///
    /// `f` gets the latest decoded document and returns the one to commit.
    /// It may run once per attempt, so it must be pure. An error from `f`
    /// aborts the update and is returned unchanged.
    pub fn transition<F>(&self, f: F) -> Result<CommitReceipt<S::Token>>
    where
        F: FnMut(Document) -> Result<Document>,
    {
        let outcome = self.manager.transition(&self.store, f)?;
        receipt(outcome)
    }
}

fn receipt<T: std::fmt::Display>(outcome: RetryOutcome<T>) -> Result<CommitReceipt<T>> {
    match outcome {
        RetryOutcome::Committed {
            token,
            attempts,
            document,
        } => Ok(CommitReceipt {
            token,
            attempts,
            document,
        }),
        RetryOutcome::Exhausted {
            attempts,
            last_conflict,
        } => Err(exhausted(attempts, &last_conflict).into()),
    }
}

/// Builder for a [`VersionedContextStore`].
///
/// # Example
///
/// ```
/// use contextsync::prelude::*;
///
/// let context = VersionedContextStore::builder()
///     .merge_key("users", "id")
///     .max_attempts(5)
///     .backoff(Backoff::Jittered { min_ms: 1, max_ms: 5 })
///     .value_encoding(ValueEncoding::JsonString)
///     .build(SeqNoMemoryStore::new())?;
/// assert_eq!(context.retry_policy().max_attempts, 5);
/// # Ok::<(), contextsync::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextStoreBuilder {
    config: ContextConfig,
}

impl ContextStoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded config.
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Declare the id field for a list-valued key.
    pub fn merge_key(mut self, key: impl Into<String>, id_field: impl Into<String>) -> Self {
        self.config.merge_keys.insert(key, id_field);
        self
    }

    /// Replace all merge keys.
    pub fn merge_keys(mut self, spec: MergeKeySpec) -> Self {
        self.config.merge_keys = spec;
        self
    }

    /// Total commit attempts per update.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Pause between conflicting attempts.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// How top-level values are stored.
    pub fn value_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.config.value_encoding = encoding;
        self
    }

    /// Validate the settings and wrap `store`.
    pub fn build<S: ContextStore>(self, store: S) -> Result<VersionedContextStore<S>> {
        VersionedContextStore::from_config(store, &self.config)
    }
}
