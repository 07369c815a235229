//! Top-level value encoding
//!
//! Some stores keep every top-level value as a JSON-encoded string rather
//! than as a JSON value. [`ValueEncoding::JsonString`] lets updates work on
//! decoded values while the store keeps its string form.
//!
//! ## Decoding
//!
//! A string that parses as JSON is replaced by the parsed value. Any other
//! string, and any non-string value, is kept as is.
//!
//! ## Re-encoding
//!
//! Only keys whose decoded value changed are re-encoded. Unchanged keys are
//! written back exactly as they were read, and keys dropped by the mutation
//! are dropped from the stored document.

use crate::error::Result;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How top-level values are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEncoding {
    /// Values are stored as JSON values
    #[default]
    Native,
    /// Values are stored as JSON-encoded strings
    ///
    /// Decoding is lossy for raw strings that happen to be valid JSON: a
    /// value stored as `"12345"` or `"true"` without encoding reads back as a
    /// number or a bool, so a typed read of it as a string fails. Such a key
    /// is still written back byte-identical unless the update changes it.
    JsonString,
}

impl ValueEncoding {
    /// Decoded view of a stored document
    pub fn decode(&self, stored: &Document) -> Document {
        match self {
            ValueEncoding::Native => stored.clone(),
            ValueEncoding::JsonString => stored
                .iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect(),
        }
    }

    /// Stored form of `next`, given the stored document it was derived from
    pub fn encode(&self, stored: &Document, next: Document) -> Result<Document> {
        match self {
            ValueEncoding::Native => Ok(next),
            ValueEncoding::JsonString => {
                let mut out = Document::new();
                for (key, value) in next {
                    let unchanged = stored
                        .get(&key)
                        .filter(|raw| decode_value(raw) == value)
                        .cloned();
                    let encoded = match unchanged {
                        Some(raw) => raw,
                        None => Value::String(serde_json::to_string(&value)?),
                    };
                    out.insert(key, encoded);
                }
                Ok(out)
            }
        }
    }
}

/// Parse a JSON-encoded string, leaving everything else untouched
pub fn decode_value(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}
