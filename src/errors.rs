//! Unified error type for the recurring schedule engine and its store.

use thiserror::Error;

/// Every failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected input: bad interval, inverted date range, unknown frequency, etc.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The caller asked for an operation the schedule's state does not allow.
    #[error("Precondition violated: {message}")]
    PreconditionViolation {
        /// Which precondition failed
        message: String,
    },

    /// No (non-deleted) schedule exists with this id.
    #[error("Recurring schedule not found: {id}")]
    ScheduleNotFound {
        /// Primary key that was looked up
        id: i64,
    },

    /// The row changed between read and write.
    #[error("Recurring schedule {id} was modified concurrently")]
    ConcurrentModification {
        /// Primary key of the contended schedule
        id: i64,
    },

    /// Problem reading or parsing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Error bubbled up from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
