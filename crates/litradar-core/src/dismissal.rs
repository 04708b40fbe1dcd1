//! Dismissed works. Dismissing a work is permanent and removes it from the
//! shortlist before the call returns.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::{LitradarError, Result};
use crate::keys::{IdentityKeys, Keyed};
use crate::models::{CandidateArticle, DismissedRecord};
use crate::shortlist::ShortlistStore;
use crate::storage::{Change, DocumentStore, scan_documents, update_document};

/// Identity sets of every dismissed record, used as an admission filter.
#[derive(Debug, Clone, Default)]
pub struct DismissedIndex {
    pub doi_keys: HashSet<String>,
    pub title_keys: HashSet<String>,
    /// Original titles, for near-duplicate matching.
    pub titles: Vec<String>,
}

impl DismissedIndex {
    pub fn from_records(records: &[DismissedRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            if !record.doi_key.is_empty() {
                index.doi_keys.insert(record.doi_key.clone());
            }
            if !record.title_key.is_empty() {
                index.title_keys.insert(record.title_key.clone());
            }
            if !record.title.trim().is_empty() {
                index.titles.push(record.title.clone());
            }
        }
        index
    }

    pub fn load(store: &dyn DocumentStore) -> Result<Self> {
        let records: Vec<DismissedRecord> = scan_documents(store, DismissedRecord::COLLECTION)?;
        Ok(Self::from_records(&records))
    }

    pub fn contains(&self, keys: &IdentityKeys) -> bool {
        (!keys.doi_key.is_empty() && self.doi_keys.contains(&keys.doi_key))
            || (!keys.title_key.is_empty() && self.title_keys.contains(&keys.title_key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DismissOutcome {
    pub dismissed: bool,
    pub record_id: String,
    pub removed_from_shortlist: usize,
}

#[derive(Clone)]
pub struct DismissalStore {
    store: Arc<dyn DocumentStore>,
    shortlist: ShortlistStore,
    max_write_attempts: u32,
}

impl DismissalStore {
    pub fn new(store: Arc<dyn DocumentStore>, shortlist: ShortlistStore, max_write_attempts: u32) -> Self {
        Self {
            store,
            shortlist,
            max_write_attempts,
        }
    }

    /// Upsert the dismissal record, then purge the shortlist of the same
    /// identity. Re-dismissing a work overwrites its single record.
    pub fn dismiss(&self, article: &CandidateArticle) -> Result<DismissOutcome> {
        let keys = article.keys();
        if keys.is_empty() {
            return Err(LitradarError::Validation(
                "dismiss requires a doi or a title".to_string(),
            ));
        }

        let record = DismissedRecord::from_article(article, Utc::now());
        let record_id = DismissedRecord::record_id(&keys);

        update_document::<DismissedRecord, _, _>(
            self.store.as_ref(),
            DismissedRecord::COLLECTION,
            &record_id,
            self.max_write_attempts,
            |_| (Change::Write(record.clone()), ()),
        )?;

        let removed = self.shortlist.purge_dismissed(&keys.doi_key, &keys.title_key)?;
        tracing::info!(
            record_id = %record_id,
            removed_from_shortlist = removed,
            "dismissed \"{}\"",
            article.title
        );

        Ok(DismissOutcome {
            dismissed: true,
            record_id,
            removed_from_shortlist: removed,
        })
    }

    /// Every dismissed record, most recent first.
    pub fn list(&self) -> Result<Vec<DismissedRecord>> {
        let mut records: Vec<DismissedRecord> =
            scan_documents(self.store.as_ref(), DismissedRecord::COLLECTION)?;
        records.sort_by(|a, b| b.date_dismissed.cmp(&a.date_dismissed));
        Ok(records)
    }

    pub fn index(&self) -> Result<DismissedIndex> {
        DismissedIndex::load(self.store.as_ref())
    }
}
