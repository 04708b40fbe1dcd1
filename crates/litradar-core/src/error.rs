use thiserror::Error;

/// All errors that can occur in litradar-core.
#[derive(Debug, Error)]
pub enum LitradarError {
    /// A required identifier was missing; the operation had no effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mandatory collaborator or credential is absent.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A versioned write kept losing to concurrent writers.
    #[error("Write conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LitradarError {
    /// True for failures of the backing store, which surface as hard errors
    /// of the shortlist and dismissal operations.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::Database(_) | Self::Conflict { .. }
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) => ExitCode::InvalidArgs,
            Self::NotConfigured(_) => ExitCode::NotConfigured,
            Self::Conflict { .. } => ExitCode::Conflict,
            Self::Io(_) => ExitCode::FileSystemError,
            Self::Persistence(_)
            | Self::Database(_)
            | Self::Json(_)
            | Self::TomlParse(_)
            | Self::TomlSerialize(_) => ExitCode::PersistenceError,
        }
    }
}

/// Exit codes used by the `litradar` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 3,
    FileSystemError = 4,
    PersistenceError = 5,
    NetworkError = 6,
    Conflict = 7,
    NotConfigured = 8,
}

pub type Result<T> = std::result::Result<T, LitradarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_classification() {
        assert!(LitradarError::Persistence("down".into()).is_persistence());
        assert!(
            LitradarError::Conflict {
                collection: "shortlist".into(),
                id: "shortlist".into()
            }
            .is_persistence()
        );
        assert!(!LitradarError::Validation("no doi".into()).is_persistence());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(
            LitradarError::Validation("x".into()).exit_code() as i32,
            ExitCode::InvalidArgs as i32
        );
        assert_eq!(
            LitradarError::NotConfigured("feed".into()).exit_code(),
            ExitCode::NotConfigured
        );
    }
}
