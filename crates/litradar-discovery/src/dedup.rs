//! Admission gate for discovered candidates. Gates run in a fixed order and
//! the first one that fires decides the [`RejectReason`].

use std::collections::HashSet;
use std::fmt;

use litradar_core::{CandidateArticle, DismissedIndex, ExistingReference, IdentityKeys, Keyed};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::relevance::RelevanceFilter;

const MIN_TITLE_CHARS: usize = 10;

static PLACEHOLDER_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\btitle\s+(pending|tbd|tba|to\s+be\s+(announced|confirmed|determined))\b|^\W*(untitled|no\s+title)\b",
    )
    .expect("valid regex")
});

/// Generic academic and function words ignored by near-duplicate matching.
/// Only words longer than three characters need listing.
const STOPWORDS: &[&str] = &[
    "about", "across", "after", "against", "also", "among", "analysis", "approach",
    "approaches", "based", "been", "being", "between", "beyond", "case", "challenges",
    "does", "during", "effect", "effects", "evidence", "examining", "exploring", "from",
    "have", "impact", "implications", "insights", "into", "more", "novel", "only",
    "other", "over", "paper", "perspective", "perspectives", "review", "role", "some",
    "studies", "study", "such", "systematic", "than", "that", "their", "them", "there",
    "these", "they", "this", "through", "toward", "towards", "under", "understanding",
    "using", "were", "what", "when", "where", "which", "while", "will", "with", "within",
    "without", "your",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidTitle,
    ExistingReference,
    Dismissed,
    NearDuplicate,
    DuplicateInRun,
    OffTopic,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTitle => "invalid_title",
            Self::ExistingReference => "existing_reference",
            Self::Dismissed => "dismissed",
            Self::NearDuplicate => "near_duplicate",
            Self::DuplicateInRun => "duplicate_in_run",
            Self::OffTopic => "off_topic",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct KeySet {
    doi_keys: HashSet<String>,
    title_keys: HashSet<String>,
}

impl KeySet {
    fn insert(&mut self, keys: &IdentityKeys) {
        if !keys.doi_key.is_empty() {
            self.doi_keys.insert(keys.doi_key.clone());
        }
        if !keys.title_key.is_empty() {
            self.title_keys.insert(keys.title_key.clone());
        }
    }

    fn contains(&self, keys: &IdentityKeys) -> bool {
        (!keys.doi_key.is_empty() && self.doi_keys.contains(&keys.doi_key))
            || (!keys.title_key.is_empty() && self.title_keys.contains(&keys.title_key))
    }
}

/// Everything one discovery run checks candidates against. Admitted keys
/// accumulate, so a context must not be shared between runs.
#[derive(Debug, Clone)]
pub struct AdmissionContext {
    existing: KeySet,
    dismissed: KeySet,
    dismissed_tokens: Vec<HashSet<String>>,
    admitted: KeySet,
    relevance: RelevanceFilter,
}

impl AdmissionContext {
    pub fn new(
        existing: &[ExistingReference],
        dismissed: &DismissedIndex,
        relevance: RelevanceFilter,
    ) -> Self {
        let mut existing_keys = KeySet::default();
        for reference in existing {
            existing_keys.insert(&reference.keys());
        }

        let dismissed_keys = KeySet {
            doi_keys: dismissed.doi_keys.clone(),
            title_keys: dismissed.title_keys.clone(),
        };

        let dismissed_tokens = dismissed
            .titles
            .iter()
            .map(|t| title_tokens(t))
            .filter(|tokens| !tokens.is_empty())
            .collect();

        Self {
            existing: existing_keys,
            dismissed: dismissed_keys,
            dismissed_tokens,
            admitted: KeySet::default(),
            relevance,
        }
    }

    /// Run every gate in order. On success the candidate's keys are recorded
    /// so later duplicates in the same run are rejected.
    pub fn admit(&mut self, candidate: &CandidateArticle) -> Result<(), RejectReason> {
        if !is_valid_title(&candidate.title) {
            return Err(RejectReason::InvalidTitle);
        }

        let keys = candidate.keys();
        if self.existing.contains(&keys) {
            return Err(RejectReason::ExistingReference);
        }
        if self.dismissed.contains(&keys) {
            return Err(RejectReason::Dismissed);
        }
        if self.is_near_dismissed(&candidate.title) {
            return Err(RejectReason::NearDuplicate);
        }
        if self.admitted.contains(&keys) {
            return Err(RejectReason::DuplicateInRun);
        }
        if !self
            .relevance
            .is_relevant(&candidate.title, candidate.abstract_text.as_deref())
        {
            return Err(RejectReason::OffTopic);
        }

        self.admitted.insert(&keys);
        Ok(())
    }

    pub fn is_admissible(&mut self, candidate: &CandidateArticle) -> bool {
        self.admit(candidate).is_ok()
    }

    fn is_near_dismissed(&self, title: &str) -> bool {
        let tokens = title_tokens(title);
        if tokens.is_empty() {
            return false;
        }
        self.dismissed_tokens.iter().any(|dismissed| {
            let overlap = dismissed.intersection(&tokens).count();
            overlap >= near_duplicate_threshold(dismissed.len())
        })
    }
}

pub fn is_valid_title(title: &str) -> bool {
    let title = title.trim();
    title.chars().count() >= MIN_TITLE_CHARS
        && title.chars().any(char::is_alphabetic)
        && !PLACEHOLDER_TITLE.is_match(title)
}

/// Lowercased alphanumeric tokens longer than three characters, minus
/// stopwords.
pub fn title_tokens(title: &str) -> HashSet<String> {
    let folded: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .filter(|t| t.chars().count() > 3 && !STOPWORD_SET.contains(*t))
        .map(ToOwned::to_owned)
        .collect()
}

/// `min(3, max(2, ceil(0.6 * n)))` for a dismissed title of `n` tokens.
pub fn near_duplicate_threshold(n: usize) -> usize {
    let sixty_percent = (n * 6).div_ceil(10);
    sixty_percent.max(2).min(3)
}
