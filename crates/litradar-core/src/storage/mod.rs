pub mod database;
pub mod memory;
pub mod versioned;

pub use database::SqliteDocumentStore;
pub use memory::MemoryDocumentStore;
pub use versioned::{Change, load_document, scan_documents, update_document};

use serde_json::Value;

use crate::error::Result;

/// A JSON document together with its storage key and write version.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub version: u64,
    pub body: Value,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The write landed; carries the new version.
    Written(u64),
    /// The stored version differed from the expected one.
    Conflict { current: Option<u64> },
}

/// Minimal document persistence: keyed get, version-conditional put, and a
/// full scan of one collection.
///
/// `expected = None` means "only if absent"; `Some(v)` means "only if the
/// stored version is still `v`". Versions start at 1.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>>;

    fn put(
        &self,
        collection: &str,
        id: &str,
        expected: Option<u64>,
        body: &Value,
    ) -> Result<PutOutcome>;

    fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>>;
}
