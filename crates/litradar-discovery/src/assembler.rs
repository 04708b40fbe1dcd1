//! Fan-out over queries and sources, admission, ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, Months, NaiveDate};
use futures::StreamExt;
use litradar_core::{
    CandidateArticle, DiscoveryConfig, DismissedIndex, ExistingReference, QueryConfig, SourceKind,
};
use serde::Serialize;

use crate::dedup::{AdmissionContext, RejectReason};
use crate::error::DiscoveryError;
use crate::relevance::RelevanceFilter;
use crate::sources::SourceAdapter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryQuery {
    pub text: String,
    pub category: Option<String>,
}

impl DiscoveryQuery {
    pub fn new(text: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            text: text.into(),
            category: category.map(ToOwned::to_owned),
        }
    }
}

impl From<&QueryConfig> for DiscoveryQuery {
    fn from(q: &QueryConfig) -> Self {
        Self::new(q.text.clone(), q.category.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Ok { count: usize },
    Failed { error: String },
    NotConfigured,
}

/// What one adapter did for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDiagnostic {
    pub source: SourceKind,
    pub query: String,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub candidates: Vec<CandidateArticle>,
    pub diagnostics: Vec<SourceDiagnostic>,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl DiscoveryReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.outcome, FetchOutcome::Failed { .. }))
    }
}

pub struct DiscoveryEngine {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    config: DiscoveryConfig,
    relevance: RelevanceFilter,
}

impl DiscoveryEngine {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, config: DiscoveryConfig) -> Self {
        Self {
            adapters,
            config,
            relevance: RelevanceFilter::default(),
        }
    }

    pub fn with_relevance(mut self, relevance: RelevanceFilter) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn queries(&self) -> Vec<DiscoveryQuery> {
        self.config
            .queries
            .iter()
            .take(self.config.max_queries)
            .map(DiscoveryQuery::from)
            .collect()
    }

    /// One discovery run as of `today`. Adapter failures never fail the run;
    /// they are reported in [`DiscoveryReport::diagnostics`].
    pub async fn discover(
        &self,
        only_new: bool,
        today: NaiveDate,
        existing: &[ExistingReference],
        dismissed: &DismissedIndex,
    ) -> DiscoveryReport {
        let lookback = if only_new {
            self.config.only_new_lookback_months
        } else {
            self.config.lookback_months
        };
        let from = today
            .checked_sub_months(Months::new(lookback))
            .unwrap_or(NaiveDate::MIN);
        let limit = self.config.max_results_per_query;

        let jobs: Vec<(DiscoveryQuery, Arc<dyn SourceAdapter>)> = self
            .queries()
            .into_iter()
            .flat_map(|q| self.adapters.iter().map(move |a| (q.clone(), Arc::clone(a))))
            .collect();

        tracing::info!(
            jobs = jobs.len(),
            %from,
            only_new,
            "starting discovery"
        );

        let results: Vec<(SourceDiagnostic, Vec<CandidateArticle>)> = futures::stream::iter(jobs)
            .map(|(query, adapter)| fetch_one(query, adapter, from, limit))
            .buffered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut ctx = AdmissionContext::new(existing, dismissed, self.relevance.clone());
        let mut report = DiscoveryReport::default();
        let new_cutoff = today
            .checked_sub_days(Days::new(self.config.new_window_days.max(0) as u64))
            .unwrap_or(NaiveDate::MIN);

        for (diagnostic, items) in results {
            report.diagnostics.push(diagnostic);
            for mut candidate in items {
                match ctx.admit(&candidate) {
                    Ok(()) => {
                        candidate.refresh_keys();
                        candidate.is_new = candidate.best_date().is_some_and(|d| d >= new_cutoff);
                        report.candidates.push(candidate);
                    }
                    Err(reason) => *report.rejected.entry(reason).or_default() += 1,
                }
            }
        }

        if !report.rejected.is_empty() {
            tracing::debug!(rejected = ?report.rejected, "candidates rejected by admission gates");
        }

        sort_newest_first(&mut report.candidates);
        if only_new {
            report.candidates.retain(|c| c.is_new);
        }
        report.candidates.truncate(self.config.max_candidates);

        tracing::info!(
            candidates = report.candidates.len(),
            failed_sources = report.failed_sources().count(),
            "discovery finished"
        );
        report
    }
}

async fn fetch_one(
    query: DiscoveryQuery,
    adapter: Arc<dyn SourceAdapter>,
    from: NaiveDate,
    limit: u32,
) -> (SourceDiagnostic, Vec<CandidateArticle>) {
    let source = adapter.kind();
    if !adapter.is_configured() {
        tracing::debug!(%source, "source not configured, skipping");
        let diagnostic = SourceDiagnostic {
            source,
            query: query.text,
            outcome: FetchOutcome::NotConfigured,
        };
        return (diagnostic, Vec::new());
    }

    match adapter.fetch(&query.text, from, limit).await {
        Ok(mut items) => {
            items.truncate(limit as usize);
            for item in &mut items {
                item.source = source;
                item.category = query.category.clone();
            }
            let diagnostic = SourceDiagnostic {
                source,
                query: query.text,
                outcome: FetchOutcome::Ok { count: items.len() },
            };
            (diagnostic, items)
        }
        Err(DiscoveryError::NotConfigured(what)) => {
            tracing::debug!(%source, %what, "source not configured");
            let diagnostic = SourceDiagnostic {
                source,
                query: query.text,
                outcome: FetchOutcome::NotConfigured,
            };
            (diagnostic, Vec::new())
        }
        Err(e) => {
            tracing::warn!(%source, query = %query.text, error = %e, "source fetch failed");
            let diagnostic = SourceDiagnostic {
                source,
                query: query.text,
                outcome: FetchOutcome::Failed {
                    error: e.to_string(),
                },
            };
            (diagnostic, Vec::new())
        }
    }
}

/// Newest best date first; an exact date beats a year-only date on the same
/// day; undated candidates last. Stable, so ties keep enumeration order.
pub fn sort_newest_first(candidates: &mut [CandidateArticle]) {
    candidates.sort_by(|a, b| compare_recency(b, a));
}

fn compare_recency(a: &CandidateArticle, b: &CandidateArticle) -> Ordering {
    a.best_date()
        .cmp(&b.best_date())
        .then_with(|| a.has_exact_date().cmp(&b.has_exact_date()))
}
