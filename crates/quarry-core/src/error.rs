//! Error types module
//!
//! All errors in the decision core are unified under the `AppError` enum.
//! Policy rejections (a build not being claimable) are NOT errors; they are
//! represented as availability results. `AppError` covers lookup faults,
//! invalid configuration, and infrastructure failures, all of which propagate
//! to the poll-handling boundary instead of being folded into "not eligible".
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so the models can be used without a database driver.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl AppError {
    /// Whether the caller may retry the failed operation. Lookup faults over
    /// the database are transient; configuration faults are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Database(_) => true,
            AppError::NotFound(_) => false,
            AppError::InvalidConfiguration(_) => false,
            AppError::Internal(_) => true,
            AppError::InternalWithSource { .. } => true,
        }
    }

    /// Error type name for structured logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidConfiguration(_) => "InvalidConfiguration",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }
}
