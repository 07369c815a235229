//! Explicit removal of merge-by-id entries.

use crate::common::{doc, ScriptedStore, Step};
use contextsync::prelude::*;

fn seeded() -> VersionedContextStore<VersionedMemoryStore> {
    VersionedContextStore::builder()
        .merge_key("mirrors", "id")
        .build(VersionedMemoryStore::with_document(doc(json!({
            "mirrors": [{"id": "1"}, {"id": "2"}, {"id": "11"}],
            "other": true
        }))))
        .unwrap()
}

#[test]
fn test_remove_only_named_ids() {
    let context = seeded();

    let token = context.remove_entries("mirrors", &[json!("11")]).unwrap();

    assert_eq!(token, Version(1));
    let (document, _) = context.fetch_latest().unwrap();
    assert_eq!(document["mirrors"], json!([{"id": "1"}, {"id": "2"}]));
    assert_eq!(document["other"], json!(true));
}

#[test]
fn test_remove_several_ids() {
    let context = seeded();

    context
        .remove_entries("mirrors", &[json!("1"), json!("11")])
        .unwrap();

    assert_eq!(
        context.store().document()["mirrors"],
        json!([{"id": "2"}])
    );
}

#[test]
fn test_remove_absent_id_is_noop_commit() {
    let context = seeded();
    let before = context.store().document();

    let token = context.remove_entries("mirrors", &[json!("404")]).unwrap();

    assert_eq!(token, Version(1));
    assert_eq!(context.store().document(), before);
}

#[test]
fn test_remove_matches_json_value_not_text() {
    let context = seeded();

    context.remove_entries("mirrors", &[json!(11)]).unwrap();

    assert_eq!(
        context.store().document()["mirrors"].as_array().unwrap().len(),
        3
    );
}

#[test]
fn test_remove_undeclared_key_rejected() {
    let context = seeded();

    let err = context
        .remove_entries("conversations", &[json!("1")])
        .unwrap_err();

    assert!(err.is_merge_key());
    assert_eq!(context.store().stats().reads, 0);
}

#[test]
fn test_merge_never_removes() {
    let context = seeded();

    context
        .update(&doc(json!({"mirrors": [{"id": "11", "remove": true}]})))
        .unwrap();

    assert_eq!(
        context.store().document()["mirrors"],
        json!([{"id": "1"}, {"id": "2"}, {"id": "11", "remove": true}])
    );
}

#[test]
fn test_remove_retries_on_conflict() {
    let store = ScriptedStore::new(
        doc(json!({"mirrors": [{"id": "1"}, {"id": "2"}]})),
        vec![Step::Interleave(doc(json!({
            "mirrors": [{"id": "1"}, {"id": "2"}, {"id": "3"}]
        })))],
    );
    let context = VersionedContextStore::builder()
        .merge_key("mirrors", "id")
        .build(store)
        .unwrap();

    context.remove_entries("mirrors", &[json!("1")]).unwrap();

    assert_eq!(context.store().read_count(), 2);
    assert_eq!(
        context.store().inner.document()["mirrors"],
        json!([{"id": "2"}, {"id": "3"}])
    );
}
