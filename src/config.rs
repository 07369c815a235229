//! Configuration for a context store.
//!
//! Settings can be built in code through
//! [`VersionedContextStore::builder`](crate::VersionedContextStore::builder)
//! or loaded from TOML:
//!
//! ```toml
//! max_attempts = 3
//! value_encoding = "json_string"
//!
//! [backoff]
//! kind = "jittered"
//! min_ms = 1
//! max_ms = 5
//!
//! [merge_keys]
//! mirrors = "investigation_id"
//! questions = "entitlement"
//! users = "id"
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::error::{Error, Result};
use contextsync_concurrency::{Backoff, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use contextsync_core::{MergeKeySpec, ValueEncoding};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of a [`VersionedContextStore`](crate::VersionedContextStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Total commit attempts per update
    pub max_attempts: u32,
    /// How top-level values are stored
    pub value_encoding: ValueEncoding,
    /// Pause between conflicting attempts
    pub backoff: Backoff,
    /// Keys whose lists merge by id
    pub merge_keys: MergeKeySpec,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            value_encoding: ValueEncoding::Native,
            backoff: Backoff::None,
            merge_keys: MergeKeySpec::new(),
        }
    }
}

impl ContextConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ContextConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts).with_backoff(self.backoff)
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> Result<()> {
        self.retry_policy().validate()?;
        for (key, field) in self.merge_keys.iter() {
            if field.is_empty() {
                return Err(Error::Config(format!(
                    "merge key for '{}' has an empty id field",
                    key
                )));
            }
        }
        Ok(())
    }
}
