//! Domain error types.

/// Top-level error type for tradejournal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("duplicate trade id: {id}")]
    DuplicateId { id: String },

    #[error("trade not found: {id}")]
    NotFound { id: String },

    #[error("failed to save journal: {reason}")]
    Persistence { reason: String },

    #[error("screenshot error: {reason}")]
    Screenshot { reason: String },

    #[error("reward error: {reason}")]
    Reward { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        JournalError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Wraps a storage-level failure as a failed save.
    pub fn persistence(err: &JournalError) -> Self {
        match err {
            JournalError::Persistence { reason } => JournalError::Persistence {
                reason: reason.clone(),
            },
            other => JournalError::Persistence {
                reason: other.to_string(),
            },
        }
    }
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) | JournalError::Screenshot { .. } => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Persistence { .. }
            | JournalError::Database { .. }
            | JournalError::DatabaseQuery { .. }
            | JournalError::Reward { .. } => 3,
            JournalError::InvalidInput { .. } => 4,
            JournalError::DuplicateId { .. } | JournalError::NotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
