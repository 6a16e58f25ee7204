//! Error types for ormlite

use thiserror::Error;

/// Result type alias for ormlite operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The record type has no registered mapping
    #[error("No mapping registered for type `{0}`")]
    UnmappedType(String),

    /// A field name that is not part of the type's mapping
    #[error("Invalid field '{field}' for `{entity}`")]
    InvalidField { entity: String, field: String },

    /// Query rejected by a driver that has no dedicated variant
    #[error("Query error: {0}")]
    Query(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("Query error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error (mappings, identifiers, config, literals)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction protocol error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid field error
    pub fn invalid_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Check if this error came from the database rejecting a statement
    pub fn is_query_error(&self) -> bool {
        match self {
            Self::Query(_)
            | Self::UniqueViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::CheckViolation(_) => true,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => true,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => true,
            _ => false,
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is an unmapped type error
    pub fn is_unmapped_type(&self) -> bool {
        matches!(self, Self::UnmappedType(_))
    }

    /// Check if this is an invalid field error
    pub fn is_invalid_field(&self) -> bool {
        matches!(self, Self::InvalidField { .. })
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    #[cfg(feature = "postgres")]
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
        Self::Postgres(err)
    }

    /// Parse a rusqlite error into a more specific OrmError
    #[cfg(feature = "sqlite")]
    pub fn from_sqlite_error(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::UniqueViolation(message);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation(message),
                ffi::SQLITE_CONSTRAINT_CHECK => return Self::CheckViolation(message),
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}
