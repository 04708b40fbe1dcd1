//! The operation surface. A [`LitradarService`] is built once from config and
//! handed to whatever front end drives it.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use litradar_core::{
    AddOutcome, AppConfig, CandidateArticle, DismissOutcome, DismissalStore, DismissedRecord,
    DocumentStore, ExistingReference, JsonReferenceFeed, LitradarError, ReferenceCascade,
    ReferenceFeed, ShortlistEntry, ShortlistStore, SqliteDocumentStore,
};

use crate::assembler::{DiscoveryEngine, DiscoveryReport};
use crate::error::Result;
use crate::relevance::RelevanceFilter;
use crate::sources::{SourceAdapter, build_adapters};

pub struct LitradarService {
    config: AppConfig,
    feed: Option<Arc<dyn ReferenceFeed>>,
    shortlist: ShortlistStore,
    dismissals: DismissalStore,
    cascade: ReferenceCascade,
    engine: DiscoveryEngine,
}

impl LitradarService {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        feed: Option<Arc<dyn ReferenceFeed>>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Self {
        let attempts = config.storage.max_write_attempts.max(1);
        let shortlist = ShortlistStore::new(Arc::clone(&store), attempts);
        let dismissals = DismissalStore::new(store, shortlist.clone(), attempts);
        let cascade = ReferenceCascade::new(shortlist.clone());
        let mut engine = DiscoveryEngine::new(adapters, config.discovery.clone());
        if let Some(keywords) = &config.discovery.keywords {
            engine = engine.with_relevance(RelevanceFilter::with_vocabulary(keywords));
        }

        Self {
            config,
            feed,
            shortlist,
            dismissals,
            cascade,
            engine,
        }
    }

    /// SQLite store under `storage.data_dir`, the JSON reference feed if one
    /// is configured, and every enabled source.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = SqliteDocumentStore::open(&config.database_path())?;
        tracing::debug!(path = ?store.path(), "document store opened");
        let feed = match JsonReferenceFeed::from_config(&config) {
            Ok(feed) => Some(Arc::new(feed) as Arc<dyn ReferenceFeed>),
            Err(e) => {
                tracing::debug!(error = %e, "no reference feed configured");
                None
            }
        };
        let adapters = build_adapters(&config.sources)?;
        Ok(Self::new(config, Arc::new(store), feed, adapters))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn list_candidates(&self, only_new: bool) -> Result<DiscoveryReport> {
        self.list_candidates_as_of(only_new, Utc::now().date_naive())
            .await
    }

    /// Discovery with an explicit assembly date.
    pub async fn list_candidates_as_of(
        &self,
        only_new: bool,
        today: NaiveDate,
    ) -> Result<DiscoveryReport> {
        let feed = self.feed.as_ref().ok_or_else(|| {
            LitradarError::NotConfigured(
                "references.feed_path is not set; discovery needs the catalogue identity feed"
                    .to_string(),
            )
        })?;
        let existing = feed.references()?;
        let dismissed = self.dismissals.index()?;

        Ok(self
            .engine
            .discover(only_new, today, &existing, &dismissed)
            .await)
    }

    pub fn get_shortlist(&self) -> Result<Vec<ShortlistEntry>> {
        Ok(self.shortlist.list(true)?)
    }

    pub fn add_to_shortlist(&self, article: CandidateArticle) -> Result<AddOutcome> {
        Ok(self.shortlist.add(article)?)
    }

    pub fn remove_from_shortlist(&self, identifier: &str) -> Result<bool> {
        Ok(self.shortlist.remove(identifier)?)
    }

    pub fn dismiss(&self, article: &CandidateArticle) -> Result<DismissOutcome> {
        Ok(self.dismissals.dismiss(article)?)
    }

    pub fn list_dismissed(&self) -> Result<Vec<DismissedRecord>> {
        Ok(self.dismissals.list()?)
    }

    pub fn on_reference_created(&self, reference: &ExistingReference) -> Result<usize> {
        Ok(self.cascade.on_reference_created(reference)?)
    }

    pub fn on_reference_updated(
        &self,
        before: &ExistingReference,
        after: &ExistingReference,
    ) -> Result<usize> {
        Ok(self.cascade.on_reference_updated(before, after)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use litradar_core::{MemoryDocumentStore, SourceKind, StaticReferenceFeed};

    use crate::error::DiscoveryError;

    struct Fixed(Vec<CandidateArticle>);

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn kind(&self) -> SourceKind {
            SourceKind::OpenAlex
        }

        async fn fetch(
            &self,
            _query: &str,
            _from: NaiveDate,
            _limit: u32,
        ) -> Result<Vec<CandidateArticle>> {
            Ok(self.0.clone())
        }
    }

    fn article(doi: &str, title: &str) -> CandidateArticle {
        CandidateArticle::new(title, SourceKind::OpenAlex)
            .with_doi(doi)
            .with_published(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    fn service(
        store: Arc<MemoryDocumentStore>,
        refs: Vec<ExistingReference>,
        items: Vec<CandidateArticle>,
    ) -> LitradarService {
        let feed: Arc<dyn ReferenceFeed> = Arc::new(StaticReferenceFeed::new(refs));
        let adapter: Arc<dyn SourceAdapter> = Arc::new(Fixed(items));
        LitradarService::new(AppConfig::default(), store, Some(feed), vec![adapter])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn dismissed_candidates_disappear_from_discovery_and_shortlist() {
        let store = Arc::new(MemoryDocumentStore::new());
        let keep = article("10.1/keep", "Creative labor and generative AI tools");
        let drop = article("10.1/drop", "AI co-creation in the design studio");
        let svc = service(store, vec![], vec![keep.clone(), drop.clone()]);

        assert_eq!(svc.add_to_shortlist(drop.clone()).unwrap(), AddOutcome::Added);
        let outcome = svc.dismiss(&drop).unwrap();
        assert_eq!(outcome.removed_from_shortlist, 1);
        assert!(svc.get_shortlist().unwrap().is_empty());
        assert_eq!(svc.list_dismissed().unwrap().len(), 1);

        let report = svc.list_candidates_as_of(false, today()).await.unwrap();
        let dois: Vec<_> = report
            .candidates
            .iter()
            .filter_map(|c| c.doi.as_deref())
            .collect();
        assert_eq!(dois, vec!["10.1/keep"]);
    }

    #[tokio::test]
    async fn discovery_without_feed_is_not_configured() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let svc = LitradarService::new(AppConfig::default(), store, None, vec![]);

        let err = svc.list_candidates_as_of(false, today()).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Core(LitradarError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn store_outage_fails_discovery() {
        let store = Arc::new(MemoryDocumentStore::new());
        let svc = service(store.clone(), vec![], vec![]);
        store.set_unavailable(true);

        let err = svc.list_candidates_as_of(false, today()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Core(ref e) if e.is_persistence()));
    }

    #[tokio::test]
    async fn configured_keywords_drive_relevance() {
        let items = vec![
            article("10.1/type", "Variable typography on the web"),
            article("10.1/ai", "Generative AI in the design studio"),
        ];
        let mut config = AppConfig::default();
        config.discovery.keywords = Some(vec!["typography".to_string()]);
        let feed: Arc<dyn ReferenceFeed> = Arc::new(StaticReferenceFeed::new(vec![]));
        let adapter: Arc<dyn SourceAdapter> = Arc::new(Fixed(items.clone()));
        let store = Arc::new(MemoryDocumentStore::new());
        let svc = LitradarService::new(config, store, Some(feed), vec![adapter]);
        assert!(svc.config().discovery.keywords.is_some());

        let report = svc.list_candidates_as_of(false, today()).await.unwrap();
        let dois: Vec<_> = report
            .candidates
            .iter()
            .filter_map(|c| c.doi.as_deref())
            .collect();
        assert_eq!(dois, vec!["10.1/type"]);

        let defaults = service(Arc::new(MemoryDocumentStore::new()), vec![], items);
        let report = defaults.list_candidates_as_of(false, today()).await.unwrap();
        let dois: Vec<_> = report
            .candidates
            .iter()
            .filter_map(|c| c.doi.as_deref())
            .collect();
        assert_eq!(dois, vec!["10.1/ai"]);
    }

    #[test]
    fn reference_update_purges_both_titles() {
        let store = Arc::new(MemoryDocumentStore::new());
        let svc = service(store, vec![], vec![]);

        svc.add_to_shortlist(CandidateArticle::new("Old Title", SourceKind::Manual))
            .unwrap();
        svc.add_to_shortlist(CandidateArticle::new("New Title", SourceKind::Manual))
            .unwrap();
        svc.add_to_shortlist(CandidateArticle::new("Unrelated", SourceKind::Manual))
            .unwrap();

        let removed = svc
            .on_reference_updated(
                &ExistingReference::new(Some("Old Title"), None),
                &ExistingReference::new(Some("New Title"), None),
            )
            .unwrap();
        assert_eq!(removed, 2);

        let left: Vec<_> = svc
            .get_shortlist()
            .unwrap()
            .into_iter()
            .map(|e| e.article.title)
            .collect();
        assert_eq!(left, vec!["Unrelated"]);
    }

    #[test]
    fn remove_accepts_url_encoded_identifier() {
        let store = Arc::new(MemoryDocumentStore::new());
        let svc = service(store, vec![], vec![]);
        svc.add_to_shortlist(article("10.1/A B", "Encoded doi creative AI"))
            .unwrap();

        assert!(svc.remove_from_shortlist("10.1%2FA%20B").unwrap());
        assert!(!svc.remove_from_shortlist("10.1%2FA%20B").unwrap());
    }

    #[test]
    fn created_reference_removes_shortlisted_work() {
        let store = Arc::new(MemoryDocumentStore::new());
        let svc = service(store, vec![], vec![]);
        svc.add_to_shortlist(article("10.1/promoted", "A promoted creative AI work"))
            .unwrap();

        let removed = svc
            .on_reference_created(&ExistingReference::new(None, Some("10.1/PROMOTED")))
            .unwrap();
        assert_eq!(removed, 1);
        assert!(svc.get_shortlist().unwrap().is_empty());
    }
}
