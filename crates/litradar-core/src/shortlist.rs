//! The curated shortlist: one aggregate document, no two entries sharing a
//! DOI key or a title key.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::dismissal::DismissedIndex;
use crate::error::{LitradarError, Result};
use crate::keys::{Keyed, decode_identifier};
use crate::models::{CandidateArticle, ShortlistAggregate, ShortlistEntry};
use crate::storage::{Change, DocumentStore, load_document, update_document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    /// The identity was dismissed earlier; nothing was written.
    SkippedDismissed,
    Duplicate,
}

#[derive(Clone)]
pub struct ShortlistStore {
    store: Arc<dyn DocumentStore>,
    max_write_attempts: u32,
}

impl ShortlistStore {
    pub fn new(store: Arc<dyn DocumentStore>, max_write_attempts: u32) -> Self {
        Self {
            store,
            max_write_attempts,
        }
    }

    fn update<R>(
        &self,
        mut mutate: impl FnMut(ShortlistAggregate) -> (Change<ShortlistAggregate>, R),
    ) -> Result<R> {
        update_document::<ShortlistAggregate, _, _>(
            self.store.as_ref(),
            ShortlistAggregate::COLLECTION,
            ShortlistAggregate::DOCUMENT_ID,
            self.max_write_attempts,
            |current| mutate(current.unwrap_or_default()),
        )
    }

    pub fn add(&self, article: CandidateArticle) -> Result<AddOutcome> {
        let keys = article.keys();
        if keys.is_empty() {
            return Err(LitradarError::Validation(
                "shortlist entries need a doi or a title".to_string(),
            ));
        }

        // Dismissals are re-read on every attempt. A dismissal always bumps
        // the aggregate version, so one that lands mid-add forces a retry.
        let added_at = Utc::now();
        let outcome = self.update(|mut aggregate| {
            match DismissedIndex::load(self.store.as_ref()) {
                Ok(dismissed) if dismissed.contains(&keys) => {
                    return (Change::Keep, Ok(AddOutcome::SkippedDismissed));
                }
                Ok(_) => {}
                Err(e) => return (Change::Keep, Err(e)),
            }
            if aggregate.contains(&keys) {
                return (Change::Keep, Ok(AddOutcome::Duplicate));
            }
            aggregate
                .entries
                .push(ShortlistEntry::new(article.clone(), added_at));
            (Change::Write(aggregate), Ok(AddOutcome::Added))
        })??;

        if outcome == AddOutcome::SkippedDismissed {
            tracing::info!(doi_key = %keys.doi_key, "skipping dismissed article");
        }
        tracing::debug!(?outcome, title_key = %keys.title_key, "shortlist add");
        Ok(outcome)
    }

    /// Remove every entry whose DOI key or title key equals `identifier`
    /// (percent-decoded, normalized). Writes only when something was removed.
    pub fn remove(&self, identifier: &str) -> Result<bool> {
        let key = decode_identifier(identifier);
        if key.is_empty() {
            return Err(LitradarError::Validation(
                "remove requires a doi or a title".to_string(),
            ));
        }

        let removed = self.update(|mut aggregate| {
            let before = aggregate.len();
            aggregate
                .entries
                .retain(|e| !e.identity().matches_identifier(&key));
            let removed = before - aggregate.len();
            if removed == 0 {
                (Change::Keep, 0)
            } else {
                (Change::Write(aggregate), removed)
            }
        })?;

        Ok(removed > 0)
    }

    /// Remove entries matching either key. Used by the dismissal and
    /// catalogue cascades.
    pub fn remove_by_keys(&self, doi_key: &str, title_key: &str) -> Result<usize> {
        if doi_key.is_empty() && title_key.is_empty() {
            return Ok(0);
        }

        let removed = self.update(|mut aggregate| {
            let removed = aggregate.retain_not_matching(doi_key, title_key);
            if removed == 0 {
                (Change::Keep, 0)
            } else {
                (Change::Write(aggregate), removed)
            }
        })?;

        if removed > 0 {
            tracing::info!(removed, doi_key, title_key, "purged shortlist entries");
        }
        Ok(removed)
    }

    /// Like [`remove_by_keys`](Self::remove_by_keys), but always writes the
    /// aggregate so concurrent adds see a version change and re-check the
    /// dismissal that was just recorded.
    pub(crate) fn purge_dismissed(&self, doi_key: &str, title_key: &str) -> Result<usize> {
        let removed = self.update(|mut aggregate| {
            let removed = aggregate.retain_not_matching(doi_key, title_key);
            (Change::Write(aggregate), removed)
        })?;

        if removed > 0 {
            tracing::info!(removed, doi_key, title_key, "purged dismissed shortlist entries");
        }
        Ok(removed)
    }

    /// Entries in insertion order. With `exclude_dismissed`, identities that
    /// were dismissed after being shortlisted are filtered out on read.
    pub fn list(&self, exclude_dismissed: bool) -> Result<Vec<ShortlistEntry>> {
        let aggregate = load_document::<ShortlistAggregate>(
            self.store.as_ref(),
            ShortlistAggregate::COLLECTION,
            ShortlistAggregate::DOCUMENT_ID,
        )?
        .map(|(aggregate, _)| aggregate)
        .unwrap_or_default();

        if !exclude_dismissed {
            return Ok(aggregate.entries);
        }

        let dismissed = DismissedIndex::load(self.store.as_ref())?;
        Ok(aggregate
            .entries
            .into_iter()
            .filter(|e| !dismissed.contains(&e.identity()))
            .collect())
    }
}
