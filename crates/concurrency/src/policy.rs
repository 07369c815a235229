//! Retry budget and pacing
//!
//! `max_attempts` counts commit attempts, not retries: a budget of 3 means at
//! most three read-merge-commit rounds. It is the only bound on an update;
//! there is no wall-clock timeout.

use contextsync_core::{ContextError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempts allowed when nothing else is configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause taken between a conflict and the next attempt
///
/// Never applied after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// Constant pause
    Fixed {
        /// Pause in milliseconds
        delay_ms: u64,
    },
    /// Uniformly random pause in `[min_ms, max_ms]`, spreading out writers
    /// that collided on the same token
    Jittered {
        /// Lower bound in milliseconds
        min_ms: u64,
        /// Upper bound in milliseconds (inclusive)
        max_ms: u64,
    },
}

impl Backoff {
    /// Pick the next pause
    pub fn delay(&self) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Jittered { min_ms, max_ms } => {
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Backoff::Jittered { min_ms, max_ms } if min_ms > max_ms => {
                Err(ContextError::InvalidConfig(format!(
                    "jittered backoff min_ms ({}) exceeds max_ms ({})",
                    min_ms, max_ms
                )))
            }
            _ => Ok(()),
        }
    }
}

/// How many times to try, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total commit attempts, at least 1
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy with the given attempt budget and no backoff
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// Replace the backoff
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Reject budgets that could never commit and inverted jitter ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ContextError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        self.backoff.validate()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
