//! Error types for Warehouse

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Result type alias using Warehouse's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Warehouse error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Lookup errors (E100-E199)
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    // Domain errors (E200-E299)
    #[error("Domain rule violated: {0}")]
    DomainRuleViolation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // Database errors (E400-E499)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a not-found error on the given entity
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "E001",
            Self::NotFound { .. } => "E100",
            Self::DomainRuleViolation(_) => "E200",
            Self::InvalidState(_) => "E201",
            Self::ConstraintViolation(_) => "E400",
            Self::Database(_) => "E401",
            Self::Migration(_) => "E402",
            Self::Config(_) => "E600",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { entity, .. } => {
                Some(format!("warehouse {}s list", entity.to_lowercase()))
            }
            Self::Migration(_) => Some("warehouse doctor".to_string()),
            Self::Config(_) => Some("warehouse config list".to_string()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation => {
                    return Self::ConstraintViolation(db_err.message().to_string());
                }
                // Primary result code without the extended constraint kind
                _ if db_err.code().as_deref() == Some("19") => {
                    return Self::ConstraintViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}
