//! Retry Protocol Tests
//!
//! - Conflict then success
//! - Exact attempt budget on sustained contention
//! - Re-read after every conflict
//! - Store failures end the update immediately
//! - Invalid updates never reach the store

use crate::common::{doc, init_tracing, ScriptedStore, Step};
use contextsync::prelude::*;
use contextsync::Error;
use std::time::{Duration, Instant};

fn context(store: ScriptedStore) -> VersionedContextStore<ScriptedStore> {
    VersionedContextStore::builder()
        .merge_key("mirrors", "id")
        .build(store)
        .unwrap()
}

// =============================================================================
// Conflict Handling
// =============================================================================

#[test]
fn test_conflict_then_success() {
    init_tracing();
    let store = ScriptedStore::new(doc(json!({})), vec![Step::Conflict, Step::Pass]);
    let context = context(store);

    let token = context
        .set_with_retry(&doc(json!({"a": 1})), &MergeKeySpec::new(), 3)
        .unwrap();

    assert_eq!(context.store().read_count(), 2);
    assert_eq!(context.store().commit_count(), 2);
    assert_eq!(token, context.store().inner.current_token());
    assert_eq!(context.store().inner.document(), doc(json!({"a": 1})));
}

#[test]
fn test_exhaustion_after_three_attempts() {
    init_tracing();
    let context = context(ScriptedStore::always_conflicting(doc(json!({}))));

    let err = context
        .set_with_retry(&doc(json!({"a": 1})), &MergeKeySpec::new(), 3)
        .unwrap_err();

    assert!(matches!(err, Error::ContextUpdateExhausted { attempts: 3, .. }));
    assert_eq!(context.store().read_count(), 3);
    assert_eq!(context.store().commit_count(), 3);
    assert_eq!(context.store().inner.document(), doc(json!({})));
}

#[test]
fn test_attempt_budget_is_exact() {
    for n in 1..=6 {
        let context = context(ScriptedStore::always_conflicting(doc(json!({}))));

        let err = context
            .set_with_retry(&doc(json!({"a": 1})), &MergeKeySpec::new(), n)
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(context.store().commit_count(), n as usize, "budget {}", n);
        assert_eq!(context.store().read_count(), n as usize, "budget {}", n);
    }
}

#[test]
fn test_default_budget_is_three() {
    let context = context(ScriptedStore::always_conflicting(doc(json!({}))));

    let err = context.update(&doc(json!({"a": 1}))).unwrap_err();

    assert!(matches!(err, Error::ContextUpdateExhausted { attempts: 3, .. }));
    assert_eq!(context.store().commit_count(), 3);
}

#[test]
fn test_success_on_last_attempt() {
    let store = ScriptedStore::new(
        doc(json!({})),
        vec![Step::Conflict, Step::Conflict, Step::Pass],
    );
    let context = context(store);

    let receipt = context.update_with_outcome(&doc(json!({"a": 1}))).unwrap();

    assert_eq!(receipt.attempts, 3);
    assert_eq!(receipt.token, Version(1));
}

#[test]
fn test_exhaustion_reports_last_conflict() {
    let store = ScriptedStore::new(
        doc(json!({})),
        vec![
            Step::Interleave(doc(json!({"x": 1}))),
            Step::Interleave(doc(json!({"x": 2}))),
        ],
    );
    let context = context(store);

    let err = context
        .set_with_retry(&doc(json!({"a": 1})), &MergeKeySpec::new(), 2)
        .unwrap_err();

    match err {
        Error::ContextUpdateExhausted {
            attempts,
            last_conflict,
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(last_conflict, "presented v1, store at v2");
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

// =============================================================================
// Re-read on Retry
// =============================================================================

#[test]
fn test_retry_refetches_and_keeps_other_writer() {
    init_tracing();
    let store = ScriptedStore::new(
        doc(json!({"mirrors": [{"id": "1", "v": "n"}]})),
        vec![Step::Interleave(doc(json!({"other": "theirs"})))],
    );
    let context = context(store);

    let token = context
        .update(&doc(json!({"mirrors": [{"id": "2", "v": "y"}]})))
        .unwrap();

    let store = context.store();
    assert_eq!(store.presented(), vec![Version(0), Version(1)]);

    let reads = store.reads();
    assert_eq!(reads.len(), 2);
    assert!(reads[0].document.get("other").is_none());
    assert_eq!(reads[1].document["other"], json!("theirs"));
    assert_eq!(reads[1].token, Version(1));

    assert_eq!(token, Version(2));
    assert_eq!(
        store.inner.document(),
        doc(json!({
            "mirrors": [{"id": "1", "v": "n"}, {"id": "2", "v": "y"}],
            "other": "theirs"
        }))
    );
}

#[test]
fn test_retry_merges_against_other_writers_entries() {
    let store = ScriptedStore::new(
        doc(json!({"mirrors": [{"id": "1"}]})),
        vec![Step::Interleave(doc(json!({
            "mirrors": [{"id": "1"}, {"id": "theirs"}]
        })))],
    );
    let context = context(store);

    context
        .update(&doc(json!({"mirrors": [{"id": "mine"}]})))
        .unwrap();

    assert_eq!(
        context.store().inner.document()["mirrors"],
        json!([{"id": "1"}, {"id": "theirs"}, {"id": "mine"}])
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unavailable_read_not_retried() {
    let store = ScriptedStore::new(doc(json!({})), Vec::new());
    store.fail_reads();
    let context = context(store);

    let err = context.update(&doc(json!({"a": 1}))).unwrap_err();

    assert!(err.is_unavailable());
    assert_eq!(context.store().commit_count(), 0);
}

#[test]
fn test_unavailable_commit_not_retried() {
    let store = ScriptedStore::new(doc(json!({})), vec![Step::Unavailable]);
    let context = context(store);

    let err = context.update(&doc(json!({"a": 1}))).unwrap_err();

    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert_eq!(context.store().read_count(), 1);
    assert_eq!(context.store().commit_count(), 1);
}

#[test]
fn test_unavailable_after_conflict_surfaces() {
    let store = ScriptedStore::new(doc(json!({})), vec![Step::Conflict, Step::Unavailable]);
    let context = context(store);

    let err = context.update(&doc(json!({"a": 1}))).unwrap_err();

    assert!(err.is_unavailable());
    assert_eq!(context.store().commit_count(), 2);
}

#[test]
fn test_merge_key_error_before_any_io() {
    let context = context(ScriptedStore::new(doc(json!({})), Vec::new()));

    let err = context
        .update(&doc(json!({"mirrors": [{"id": "1"}, {"name": "anonymous"}]})))
        .unwrap_err();

    assert!(err.is_merge_key());
    assert_eq!(context.store().read_count(), 0);
    assert_eq!(context.store().commit_count(), 0);
}

#[test]
fn test_zero_attempts_rejected() {
    let context = context(ScriptedStore::new(doc(json!({})), Vec::new()));

    let err = context
        .set_with_retry(&doc(json!({"a": 1})), &MergeKeySpec::new(), 0)
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(context.store().read_count(), 0);
}

// =============================================================================
// Backoff
// =============================================================================

#[test]
fn test_fixed_backoff_between_attempts() {
    let store = ScriptedStore::new(
        doc(json!({})),
        vec![Step::Conflict, Step::Conflict, Step::Pass],
    );
    let context = VersionedContextStore::builder()
        .backoff(Backoff::Fixed { delay_ms: 20 })
        .build(store)
        .unwrap();

    let start = Instant::now();
    context.update(&doc(json!({"a": 1}))).unwrap();

    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_no_backoff_after_final_attempt() {
    let context = VersionedContextStore::builder()
        .max_attempts(1)
        .backoff(Backoff::Fixed { delay_ms: 5_000 })
        .build(ScriptedStore::always_conflicting(doc(json!({}))))
        .unwrap();

    let start = Instant::now();
    let err = context.update(&doc(json!({"a": 1}))).unwrap_err();

    assert!(err.is_exhausted());
    assert!(start.elapsed() < Duration::from_millis(5_000));
}
