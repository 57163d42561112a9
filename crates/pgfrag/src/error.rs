//! Error types for pgfrag

use thiserror::Error;

/// Result type alias for pgfrag operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while building fragments or running them.
#[derive(Debug, Error)]
pub enum SqlError {
    /// `insert`/`multi_insert`/`set` received a mapping without defined keys
    #[error("no columns")]
    NoColumns,

    /// `multi_insert` received an empty row list
    #[error("no rows")]
    NoRows,

    /// A condition combinator had nothing to combine and no default
    #[error("no conditions")]
    NoConditions,

    /// A `multi_insert` row does not define the same columns as the first row
    #[error("row {row} defines columns [{found}], expected [{expected}]")]
    ColumnMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// Template segments and values are not interleaved as `n + 1` / `n`
    #[error("template has {segments} text segments for {values} values")]
    Template { segments: usize, values: usize },

    /// Invalid input (identifier syntax etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// ROLLBACK failed after the transaction body had already failed.
    ///
    /// `original` is the body's error and is also the `source()` of this error.
    #[error("{original} (rollback failed: {rollback})")]
    RollbackFailed {
        #[source]
        original: Box<SqlError>,
        rollback: Box<SqlError>,
    },

    /// Application error raised inside a transaction body
    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync>),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap an application error so it can be returned from a transaction body.
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(err))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The error that started the failure.
    ///
    /// For [`SqlError::RollbackFailed`] this is the transaction body's error; for everything
    /// else it is `self`.
    pub fn original(&self) -> &SqlError {
        match self {
            Self::RollbackFailed { original, .. } => original.original(),
            other => other,
        }
    }

    /// Parse a tokio_postgres error into a more specific SqlError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn rollback_failure_keeps_original_as_source() {
        let err = SqlError::RollbackFailed {
            original: Box::new(SqlError::NoRows),
            rollback: Box::new(SqlError::Other("connection reset".into())),
        };

        assert_eq!(err.to_string(), "no rows (rollback failed: connection reset)");
        assert!(matches!(err.original(), SqlError::NoRows));
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "no rows");
    }

    #[test]
    fn handler_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = SqlError::handler(io);
        assert_eq!(err.to_string(), "disk full");
        assert!(matches!(err.original(), SqlError::Handler(_)));
    }

    #[test]
    fn construction_errors_render() {
        assert_eq!(SqlError::NoColumns.to_string(), "no columns");
        assert_eq!(SqlError::NoConditions.to_string(), "no conditions");
        assert_eq!(
            SqlError::Template { segments: 3, values: 1 }.to_string(),
            "template has 3 text segments for 1 values"
        );
    }
}
