//! Hooks the reference catalogue calls after it writes a canonical reference.
//! A work that has been promoted into the catalogue must not linger on the
//! shortlist under either its old or its new identity.

use crate::error::Result;
use crate::keys::Keyed;
use crate::models::ExistingReference;
use crate::shortlist::ShortlistStore;

#[derive(Clone)]
pub struct ReferenceCascade {
    shortlist: ShortlistStore,
}

impl ReferenceCascade {
    pub fn new(shortlist: ShortlistStore) -> Self {
        Self { shortlist }
    }

    pub fn on_reference_created(&self, reference: &ExistingReference) -> Result<usize> {
        let keys = reference.keys();
        self.shortlist.remove_by_keys(&keys.doi_key, &keys.title_key)
    }

    pub fn on_reference_updated(
        &self,
        before: &ExistingReference,
        after: &ExistingReference,
    ) -> Result<usize> {
        let old = before.keys();
        let new = after.keys();
        let mut removed = self.shortlist.remove_by_keys(&old.doi_key, &old.title_key)?;
        if new != old {
            removed += self.shortlist.remove_by_keys(&new.doi_key, &new.title_key)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{CandidateArticle, SourceKind};
    use crate::storage::MemoryDocumentStore;

    fn setup() -> (ShortlistStore, ReferenceCascade) {
        let shortlist = ShortlistStore::new(Arc::new(MemoryDocumentStore::new()), 5);
        (shortlist.clone(), ReferenceCascade::new(shortlist))
    }

    #[test]
    fn created_reference_purges_matching_entry() {
        let (shortlist, cascade) = setup();
        shortlist
            .add(CandidateArticle::new("Promoted Paper", SourceKind::Arxiv).with_doi("10.1/p"))
            .unwrap();
        shortlist
            .add(CandidateArticle::new("Another Paper", SourceKind::Arxiv))
            .unwrap();

        let removed = cascade
            .on_reference_created(&ExistingReference::new(None, Some("10.1/P")))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(shortlist.list(false).unwrap().len(), 1);
    }

    #[test]
    fn updated_title_purges_old_and_new_identity() {
        let (shortlist, cascade) = setup();
        shortlist
            .add(CandidateArticle::new("Old Title", SourceKind::OpenAlex))
            .unwrap();
        shortlist
            .add(CandidateArticle::new("New Title", SourceKind::CrossRef))
            .unwrap();
        shortlist
            .add(CandidateArticle::new("Bystander", SourceKind::CrossRef))
            .unwrap();

        let removed = cascade
            .on_reference_updated(
                &ExistingReference::new(Some("Old Title"), None),
                &ExistingReference::new(Some("New Title"), None),
            )
            .unwrap();
        assert_eq!(removed, 2);
        let left = shortlist.list(false).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].article.title, "Bystander");
    }

    #[test]
    fn reference_without_identity_is_a_no_op() {
        let (shortlist, cascade) = setup();
        shortlist
            .add(CandidateArticle::new("Kept", SourceKind::Core))
            .unwrap();
        assert_eq!(
            cascade
                .on_reference_created(&ExistingReference::default())
                .unwrap(),
            0
        );
        assert_eq!(shortlist.list(false).unwrap().len(), 1);
    }
}
