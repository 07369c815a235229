//! Shared fixtures: a scripted store and document helpers.

#![allow(dead_code)]

use contextsync::{CasError, Conflict, ContextError, ContextStore, Document, Snapshot, Version};
use contextsync::VersionedMemoryStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

/// Install a test subscriber once so `tracing` output shows up on failure
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Build a document from a `json!` object
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// What the scripted store does with the next commit
#[derive(Debug, Clone)]
pub enum Step {
    /// Forward to the inner store
    Pass,
    /// Reject with a conflict, leaving the inner store alone
    Conflict,
    /// Another writer commits these top-level values first, then the commit
    /// is forwarded (and conflicts for real)
    Interleave(Document),
    /// Fail as unreachable
    Unavailable,
}

/// Store whose commit behavior is scripted step by step
///
/// Wraps a real [`VersionedMemoryStore`] and records every read and every
/// token presented on commit.
pub struct ScriptedStore {
    pub inner: VersionedMemoryStore,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    fail_reads: Mutex<bool>,
    reads: Mutex<Vec<Snapshot<Version>>>,
    presented: Mutex<Vec<Version>>,
}

impl ScriptedStore {
    /// Run `steps` in order, then pass every later commit through
    pub fn new(seed: Document, steps: Vec<Step>) -> Self {
        Self::with_fallback(seed, steps, Step::Pass)
    }

    /// Every commit conflicts
    pub fn always_conflicting(seed: Document) -> Self {
        Self::with_fallback(seed, Vec::new(), Step::Conflict)
    }

    fn with_fallback(seed: Document, steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            inner: VersionedMemoryStore::with_document(seed),
            script: Mutex::new(steps.into()),
            fallback,
            fail_reads: Mutex::new(false),
            reads: Mutex::new(Vec::new()),
            presented: Mutex::new(Vec::new()),
        }
    }

    /// Make every read fail as unreachable
    pub fn fail_reads(&self) {
        *self.fail_reads.lock() = true;
    }

    /// Number of reads served
    pub fn read_count(&self) -> usize {
        self.reads.lock().len()
    }

    /// Snapshots served, in order
    pub fn reads(&self) -> Vec<Snapshot<Version>> {
        self.reads.lock().clone()
    }

    /// Number of commits attempted
    pub fn commit_count(&self) -> usize {
        self.presented.lock().len()
    }

    /// Tokens presented on commit, in order
    pub fn presented(&self) -> Vec<Version> {
        self.presented.lock().clone()
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl ContextStore for ScriptedStore {
    type Token = Version;

    fn read(&self) -> Result<Snapshot<Version>, ContextError> {
        if *self.fail_reads.lock() {
            return Err(ContextError::StoreUnavailable("scripted outage".into()));
        }
        let snapshot = self.inner.read()?;
        self.reads.lock().push(snapshot.clone());
        Ok(snapshot)
    }

    fn compare_and_swap(
        &self,
        document: Document,
        expected: &Version,
    ) -> Result<Version, CasError<Version>> {
        self.presented.lock().push(*expected);
        match self.next_step() {
            Step::Pass => self.inner.compare_and_swap(document, expected),
            Step::Conflict => Err(CasError::Conflict(Conflict::opaque(*expected))),
            Step::Interleave(other) => {
                let current = self.inner.current_token();
                let mut theirs = self.inner.document();
                theirs.extend(other);
                self.inner
                    .compare_and_swap(theirs, &current)
                    .expect("interleaved writer commits on the current token");
                self.inner.compare_and_swap(document, expected)
            }
            Step::Unavailable => Err(CasError::Unavailable("scripted outage".into())),
        }
    }
}
