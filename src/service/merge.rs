//! Status merger
//!
//! Reconciles an incoming status into a collection of displayed statuses.
//! Every view (timeline, thread sections, notification feed) holds its own
//! copies and runs them through these functions; untouched elements keep
//! their `Arc` identity so views can skip redrawing them.

use std::sync::Arc;

use crate::data::Status;

/// Merge `updated` into a single displayed element.
///
/// Returns `None` when no rule applies. Rules are tried in order:
/// 1. same id: the element is replaced by `updated`
/// 2. the element wraps `updated`: its reblog payload is replaced
/// 3. both wrap the same original: the payload is taken from `updated`
pub fn merge_one(element: &Arc<Status>, updated: &Arc<Status>) -> Option<Arc<Status>> {
    if element.id == updated.id {
        return Some(updated.clone());
    }

    let payload = element.reblog.as_ref()?;
    if payload.id == updated.id {
        return Some(rewrap(element, updated.clone()));
    }

    match &updated.reblog {
        Some(original) if original.id == payload.id => Some(rewrap(element, original.clone())),
        _ => None,
    }
}

fn rewrap(wrapper: &Status, payload: Arc<Status>) -> Arc<Status> {
    Arc::new(Status {
        reblog: Some(payload),
        ..wrapper.clone()
    })
}

/// Produce a new collection with every matching element merged.
///
/// Order is preserved. A collection with no match comes back equal to the
/// input.
pub fn merge(collection: &[Arc<Status>], updated: &Arc<Status>) -> Vec<Arc<Status>> {
    collection
        .iter()
        .map(|element| merge_one(element, updated).unwrap_or_else(|| element.clone()))
        .collect()
}

/// Merge into `collection` in place of the old value.
///
/// Returns the number of replaced elements.
pub fn apply(collection: &mut Vec<Arc<Status>>, updated: &Arc<Status>) -> usize {
    let mut touched = 0;
    let merged = collection
        .iter()
        .map(|element| match merge_one(element, updated) {
            Some(replacement) => {
                touched += 1;
                replacement
            }
            None => element.clone(),
        })
        .collect();
    if touched > 0 {
        *collection = merged;
    }
    touched
}

/// True when `element` shows the status `id`, directly or as a reblog payload
pub fn shows(element: &Status, id: &str) -> bool {
    element.id == id || element.reblog.as_ref().is_some_and(|payload| payload.id == id)
}

/// Produce a new collection without the deleted status or any wrapper of it
pub fn remove(collection: &[Arc<Status>], deleted_id: &str) -> Vec<Arc<Status>> {
    collection
        .iter()
        .filter(|element| !shows(element, deleted_id))
        .cloned()
        .collect()
}

/// Remove the deleted status from `collection`; returns the number removed
pub fn apply_removal(collection: &mut Vec<Arc<Status>>, deleted_id: &str) -> usize {
    let before = collection.len();
    collection.retain(|element| !shows(element, deleted_id));
    before - collection.len()
}
