//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// Establishing the connection pool failed.
    Connect {
        /// Underlying connection error.
        source: sqlx::Error,
    },
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
}

impl DataError {
    /// Whether the underlying failure is a unique-constraint violation.
    ///
    /// Lets callers surface duplicate-name inserts as a conflict instead of
    /// a generic failure.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.database_source()
            .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
    }

    /// Whether the underlying failure is a foreign-key violation.
    ///
    /// Lets callers reject references to missing rows as a client error.
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_source()
            .is_some_and(sqlx::error::DatabaseError::is_foreign_key_violation)
    }

    fn database_source(&self) -> Option<&dyn sqlx::error::DatabaseError> {
        match self {
            Self::Connect { source } | Self::QueryFailed { source, .. } => {
                source.as_database_error()
            }
            Self::MigrationFailed { .. } => None,
        }
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { .. } => formatter.write_str("database connection failed"),
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect { source } | Self::QueryFailed { source, .. } => Some(source),
            Self::MigrationFailed { source } => Some(source),
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(source: sqlx::Error) -> Self {
        Self::QueryFailed {
            operation: "sqlx operation",
            source,
        }
    }
}

pub(crate) fn map_query_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}
