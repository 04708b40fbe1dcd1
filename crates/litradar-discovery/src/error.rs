use litradar_core::{ExitCode, LitradarError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Core(#[from] LitradarError),
}

impl DiscoveryError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Core(e) => e.exit_code(),
            Self::NotConfigured(_) => ExitCode::NotConfigured,
            Self::Http(_) | Self::ApiError(..) | Self::RateLimit(..) | Self::SourceUnavailable(_) => {
                ExitCode::NetworkError
            }
            Self::InvalidDoi(_) | Self::Parse(_) => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
