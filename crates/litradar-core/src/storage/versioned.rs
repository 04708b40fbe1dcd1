//! Typed read-modify-write on top of [`DocumentStore`].
//!
//! Every mutation reads the current version, applies the caller's change and
//! writes conditionally on that version. A lost race re-reads and re-applies,
//! up to `max_attempts` times.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{DocumentStore, PutOutcome};
use crate::error::{LitradarError, Result};

/// What a mutation wants done with the document it was handed.
#[derive(Debug)]
pub enum Change<T> {
    Write(T),
    Keep,
}

pub fn load_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<(T, u64)>> {
    match store.get(collection, id)? {
        Some(doc) => Ok(Some((serde_json::from_value(doc.body)?, doc.version))),
        None => Ok(None),
    }
}

/// Deserialize every document of a collection. Documents that no longer
/// match `T` are skipped with a warning.
pub fn scan_documents<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
) -> Result<Vec<T>> {
    let docs = store.scan(collection)?;
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value(doc.body) {
            Ok(value) => out.push(value),
            Err(e) => tracing::warn!(collection, id = %doc.id, "skipping unreadable document: {e}"),
        }
    }
    Ok(out)
}

/// Compare-and-swap update. `mutate` receives the current value (if any) and
/// returns the change to apply plus a result for the caller. It may run more
/// than once, so it must not have side effects outside its return value.
pub fn update_document<T, R, F>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    max_attempts: u32,
    mut mutate: F,
) -> Result<R>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(Option<T>) -> (Change<T>, R),
{
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        let (current, version) = match load_document::<T>(store, collection, id)? {
            Some((value, version)) => (Some(value), Some(version)),
            None => (None, None),
        };

        let (change, result) = mutate(current);
        let next = match change {
            Change::Keep => return Ok(result),
            Change::Write(next) => next,
        };

        let body = serde_json::to_value(&next)?;
        match store.put(collection, id, version, &body)? {
            PutOutcome::Written(_) => return Ok(result),
            PutOutcome::Conflict { current } => {
                tracing::debug!(
                    collection,
                    id,
                    attempt,
                    expected = ?version,
                    current = ?current,
                    "version conflict, retrying"
                );
            }
        }
    }

    Err(LitradarError::Conflict {
        collection: collection.to_string(),
        id: id.to_string(),
    })
}
