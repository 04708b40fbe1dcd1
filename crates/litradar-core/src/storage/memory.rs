use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use super::{DocumentStore, PutOutcome, StoredDocument};
use crate::error::{LitradarError, Result};

type Key = (String, String);

/// In-process store, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<BTreeMap<Key, (u64, Value)>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a persistence error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LitradarError::Persistence(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Key, (u64, Value)>>> {
        self.docs
            .lock()
            .map_err(|_| LitradarError::Persistence("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        self.check_available()?;
        let docs = self.lock()?;
        Ok(docs
            .get(&(collection.to_string(), id.to_string()))
            .map(|(version, body)| StoredDocument {
                id: id.to_string(),
                version: *version,
                body: body.clone(),
            }))
    }

    fn put(
        &self,
        collection: &str,
        id: &str,
        expected: Option<u64>,
        body: &Value,
    ) -> Result<PutOutcome> {
        self.check_available()?;
        let mut docs = self.lock()?;
        let key = (collection.to_string(), id.to_string());
        let current = docs.get(&key).map(|(v, _)| *v);
        if current != expected {
            return Ok(PutOutcome::Conflict { current });
        }
        let next = current.unwrap_or(0) + 1;
        docs.insert(key, (next, body.clone()));
        Ok(PutOutcome::Written(next))
    }

    fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        self.check_available()?;
        let docs = self.lock()?;
        Ok(docs
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), (version, body))| StoredDocument {
                id: id.clone(),
                version: *version,
                body: body.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_is_conditional_on_version() {
        let store = MemoryDocumentStore::new();
        assert_eq!(
            store.put("c", "a", None, &json!({"n": 1})).unwrap(),
            PutOutcome::Written(1)
        );
        assert_eq!(
            store.put("c", "a", None, &json!({"n": 2})).unwrap(),
            PutOutcome::Conflict { current: Some(1) }
        );
        assert_eq!(
            store.put("c", "a", Some(1), &json!({"n": 2})).unwrap(),
            PutOutcome::Written(2)
        );
        assert_eq!(store.get("c", "a").unwrap().unwrap().body["n"], 2);
    }

    #[test]
    fn scan_is_scoped_to_collection() {
        let store = MemoryDocumentStore::new();
        store.put("a", "1", None, &json!(1)).unwrap();
        store.put("b", "1", None, &json!(2)).unwrap();
        let docs = store.scan("a").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body, json!(1));
    }

    #[test]
    fn unavailable_store_fails_hard() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get("c", "a"),
            Err(LitradarError::Persistence(_))
        ));
    }
}
