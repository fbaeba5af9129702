//! Database error types
//!
//! SQLSTATE codes are classified here once so the adapters can hand the
//! billing domain a [`PortError`] with the right kind.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Row lookup came back empty
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// unique_violation (23505)
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// check_violation (23514) or restrict_violation (23001)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be mapped into domain types
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// No connection became free within the acquire timeout
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything without a more specific variant
    #[error("SQL error: {0}")]
    SqlError(#[source] sqlx::Error),
}

impl DatabaseError {
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("User", "cashier01");
    /// assert!(error.to_string().contains("cashier01"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{entity} '{id}' not found"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_) | DatabaseError::ConstraintViolation(_)
        )
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Maps the errors that have a specific variant; `None` for everything else
fn classify(error: &sqlx::Error) -> Option<DatabaseError> {
    match error {
        sqlx::Error::RowNotFound => Some(DatabaseError::NotFound("row not found".to_string())),
        sqlx::Error::PoolTimedOut => Some(DatabaseError::PoolExhausted),
        sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            Some(DatabaseError::ConnectionFailed(error.to_string()))
        }
        // https://www.postgresql.org/docs/current/errcodes-appendix.html
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code()?.as_ref() {
                "23505" => Some(DatabaseError::DuplicateEntry(message)),
                "23514" | "23001" => Some(DatabaseError::ConstraintViolation(message)),
                _ => None,
            }
        }
        _ => None,
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        classify(&error).unwrap_or(DatabaseError::SqlError(error))
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "Record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message) | DatabaseError::ConstraintViolation(message) => {
                PortError::Conflict { message }
            }
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::Connection {
                message: "connection pool exhausted".to_string(),
                source: None,
            },
            DatabaseError::InvalidData(message) => PortError::Transformation { message },
            DatabaseError::SqlError(source) => PortError::Internal {
                message: "database query failed".to_string(),
                source: Some(Box::new(source)),
            },
            DatabaseError::MigrationFailed(message) => PortError::internal(message),
        }
    }
}
