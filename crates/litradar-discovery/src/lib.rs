//! Source adapters, admission gates, ranking and the service context that
//! exposes every litradar operation.

pub mod assembler;
pub mod dedup;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod relevance;
pub mod service;
pub mod sources;

pub use assembler::{
    DiscoveryEngine, DiscoveryQuery, DiscoveryReport, FetchOutcome, SourceDiagnostic,
    sort_newest_first,
};
pub use dedup::{AdmissionContext, RejectReason};
pub use error::{DiscoveryError, Result};
pub use relevance::RelevanceFilter;
pub use service::LitradarService;
pub use sources::{SourceAdapter, build_adapters};
