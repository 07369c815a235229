//! Core data types
//!
//! - [`Document`]: the shared context, a JSON object keyed by top-level name
//! - [`Snapshot`]: a document together with the token it was read under
//! - [`MergeKeySpec`]: top-level key to unique-id field, for list merging

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The shared context document
///
/// Top-level keys map to arbitrary JSON values. Insertion order is preserved
/// so that a document written back looks like the one that was read.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A point-in-time read of the shared document
///
/// Snapshots are transient: they live for one update attempt and are never
/// cached across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Document content at read time
    pub document: Document,
    /// Token the document was read under
    pub token: T,
}

impl<T> Snapshot<T> {
    /// Create a snapshot
    pub fn new(document: Document, token: T) -> Self {
        Self { document, token }
    }

    /// Split into content and token
    pub fn into_parts(self) -> (Document, T) {
        (self.document, self.token)
    }
}

/// Declares which list-valued keys merge by id
///
/// Maps a top-level document key to the field that uniquely identifies
/// entries in that key's list. Keys not declared here are replaced wholesale
/// by an update.
///
/// Serializes as a plain table so it can be declared in configuration:
///
/// ```toml
/// [merge_keys]
/// mirrors = "investigation_id"
/// users = "id"
/// ```
///
/// # Examples
///
/// ```
/// use contextsync_core::MergeKeySpec;
///
/// let spec = MergeKeySpec::new()
///     .with("mirrors", "investigation_id")
///     .with("users", "id");
/// assert_eq!(spec.id_field("users"), Some("id"));
/// assert_eq!(spec.id_field("conversations"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeKeySpec(BTreeMap<String, String>);

impl MergeKeySpec {
    /// Empty spec: every key is replace-not-merge
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style declaration of a merge key
    pub fn with(mut self, key: impl Into<String>, id_field: impl Into<String>) -> Self {
        self.insert(key, id_field);
        self
    }

    /// Declare (or redeclare) the id field for a key
    pub fn insert(&mut self, key: impl Into<String>, id_field: impl Into<String>) {
        self.0.insert(key.into(), id_field.into());
    }

    /// Id field for a key, if the key merges by id
    pub fn id_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the spec declares any keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of declared keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(key, id_field)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MergeKeySpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = MergeKeySpec::new();
        for (k, v) in iter {
            spec.insert(k, v);
        }
        spec
    }
}
