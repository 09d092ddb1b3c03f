//! Error types for ledgersql

use thiserror::Error;

/// Result type alias for ledgersql operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error types for statement construction and execution.
///
/// `Syntax` and `Structural` point at a broken template or descriptor and are
/// never caused by request data. `Validation` and `Encoding` come from the
/// inbound request and are meant to be shown to the client.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A hard-coded template failed to parse or render
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// A mutator precondition was violated
    #[error("Structural error: {0}")]
    Structural(String),

    /// Malformed sort token, paging value or filter combination
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed request payload or unknown field
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

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

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl LedgerError {
    /// Create a syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    /// Create a structural error
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

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

    /// Errors originating from request input, safe to surface to the client.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Encoding(_))
    }

    /// Errors that indicate a defect in a template or resource descriptor.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Syntax(_) | Self::Structural(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific LedgerError
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
impl From<deadpool_postgres::PoolError> for LedgerError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(LedgerError::validation("bad sort").is_client_error());
        assert!(LedgerError::encoding("unknown field").is_client_error());
        assert!(!LedgerError::syntax("bad template").is_client_error());

        assert!(LedgerError::syntax("bad template").is_fatal());
        assert!(LedgerError::structural("two FROM entries").is_fatal());
        assert!(!LedgerError::validation("bad sort").is_fatal());
        assert!(!LedgerError::not_found("account").is_fatal());
    }

    #[test]
    fn display_carries_kind() {
        let err = LedgerError::validation("malformed sort token 'x:UP'");
        assert_eq!(err.to_string(), "Validation error: malformed sort token 'x:UP'");

        let err = LedgerError::decode("display_name", "unexpected null");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'display_name': unexpected null"
        );
    }
}
