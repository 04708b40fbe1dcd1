pub mod cascade;
pub mod config;
pub mod dismissal;
pub mod error;
pub mod keys;
pub mod models;
pub mod references;
pub mod shortlist;
pub mod storage;

pub use config::{AppConfig, DiscoveryConfig, QueryConfig, SourcesConfig};
pub use error::{ExitCode, LitradarError, Result};
pub use keys::{IdentityKeys, Keyed, decode_identifier, keys_of, normalize_key};
pub use models::*;

pub use cascade::ReferenceCascade;
pub use dismissal::{DismissOutcome, DismissalStore, DismissedIndex};
pub use references::{JsonReferenceFeed, ReferenceFeed, StaticReferenceFeed};
pub use shortlist::{AddOutcome, ShortlistStore};
pub use storage::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};
