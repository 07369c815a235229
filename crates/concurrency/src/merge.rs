//! Client-side merge of partial updates
//!
//! The store can only swap the whole document, so merging happens here,
//! against a fresh read, on every attempt. Everything in this module is pure:
//! no I/O, no shared state, same inputs give the same output.
//!
//! ## Merge Rules
//!
//! For each key in the update:
//!
//! | Spec declares id field | Current is list | Update is list | Result |
//! |------------------------|-----------------|----------------|--------|
//! | yes | yes | yes | merge by id |
//! | otherwise | | | update replaces current |
//!
//! Merge by id: an update entry replaces every current entry with the same id
//! in place, or is appended if no entry matches. Entries only present in the
//! current list are kept. Nothing is ever deleted through a merge; see
//! [`remove_by_id`] for explicit removal.

use contextsync_core::{Document, MergeKeyError, MergeKeySpec};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Check every merge-by-id list in `updates` before anything is applied
///
/// Each entry of a list stored under a declared key must be an object with a
/// non-null id field. Values under declared keys that are not lists are not
/// checked; they replace the current value.
pub fn validate_updates(updates: &Document, spec: &MergeKeySpec) -> Result<(), MergeKeyError> {
    for (key, value) in updates {
        let (Some(field), Value::Array(items)) = (spec.id_field(key), value) else {
            continue;
        };
        for (index, item) in items.iter().enumerate() {
            let Value::Object(entry) = item else {
                return Err(MergeKeyError::NotAnObject {
                    key: key.clone(),
                    index,
                });
            };
            match entry.get(field) {
                None | Some(Value::Null) => {
                    return Err(MergeKeyError::MissingId {
                        key: key.clone(),
                        field: field.to_string(),
                        index,
                    })
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Apply `updates` on top of `current`
///
/// Keys absent from `updates` are left untouched. Fails with
/// [`MergeKeyError`] before merging anything if an update entry under a
/// declared key has no id.
///
/// # Example
///
/// ```
/// use contextsync_concurrency::compute_merged;
/// use contextsync_core::{Document, MergeKeySpec};
/// use serde_json::json;
///
/// let current: Document = serde_json::from_value(json!({
///     "mirrors": [{"id": "1", "v": "n"}, {"id": "2", "v": "n"}]
/// })).unwrap();
/// let updates: Document = serde_json::from_value(json!({
///     "mirrors": [{"id": "1", "v": "y"}, {"id": "3", "v": "y"}]
/// })).unwrap();
/// let spec = MergeKeySpec::new().with("mirrors", "id");
///
/// let merged = compute_merged(&current, &updates, &spec).unwrap();
/// assert_eq!(merged["mirrors"], json!([
///     {"id": "1", "v": "y"}, {"id": "2", "v": "n"}, {"id": "3", "v": "y"}
/// ]));
/// ```
pub fn compute_merged(
    current: &Document,
    updates: &Document,
    spec: &MergeKeySpec,
) -> Result<Document, MergeKeyError> {
    validate_updates(updates, spec)?;

    let mut merged = current.clone();
    for (key, update) in updates {
        let value = match (spec.id_field(key), current.get(key), update) {
            (Some(field), Some(Value::Array(existing)), Value::Array(incoming)) => {
                Value::Array(merge_by_id(existing, incoming, field))
            }
            _ => update.clone(),
        };
        merged.insert(key.clone(), value);
    }
    Ok(merged)
}

/// Merge two entry lists on `id_field`
///
/// Order of the result: current entries in their original order (replaced
/// in place where the update carries the same id), then entries with new ids
/// in update order. If the update repeats an id, the last occurrence wins.
/// If the current list repeats an id, every copy is replaced, so no stale
/// entry survives next to the update.
///
/// Entries without an id (in either list) can't be matched; current ones are
/// kept as they are, update ones are appended. Callers that need ids enforced
/// run [`validate_updates`] first.
pub fn merge_by_id(current: &[Value], updates: &[Value], id_field: &str) -> Vec<Value> {
    let mut merged = current.to_vec();
    let mut positions: HashMap<String, Vec<usize>> = HashMap::with_capacity(current.len());

    for (i, entry) in current.iter().enumerate() {
        if let Some(id) = id_of(entry, id_field) {
            positions.entry(id).or_default().push(i);
        }
    }

    for entry in updates {
        match id_of(entry, id_field) {
            Some(id) => match positions.get(&id) {
                Some(slots) => {
                    for &i in slots {
                        merged[i] = entry.clone();
                    }
                }
                None => {
                    positions.insert(id, vec![merged.len()]);
                    merged.push(entry.clone());
                }
            },
            None => merged.push(entry.clone()),
        }
    }
    merged
}

/// Drop entries whose id is in `ids` from the list under `key`
///
/// This is the explicit deletion path; merges never delete. Returns the
/// document unchanged if the key is absent or not a list.
pub fn remove_by_id(current: &Document, key: &str, id_field: &str, ids: &[Value]) -> Document {
    let mut next = current.clone();
    if let Some(Value::Array(entries)) = next.get_mut(key) {
        let doomed: HashSet<String> = ids.iter().map(Value::to_string).collect();
        entries.retain(|entry| match id_of(entry, id_field) {
            Some(id) => !doomed.contains(&id),
            None => true,
        });
    }
    next
}

/// Canonical id of an entry
///
/// Ids are compared as JSON, so `"1"` and `1` are different ids.
fn id_of(entry: &Value, id_field: &str) -> Option<String> {
    match entry.get(id_field) {
        None | Some(Value::Null) => None,
        Some(id) => Some(id.to_string()),
    }
}
