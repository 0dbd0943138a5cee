use thiserror::Error;

/// Error code for query strings that are not valid JSON
pub const VAL_JSON: &str = "VAL_JSON";

/// Error code for JSON that does not describe a filter condition
pub const VAL_CONDITION: &str = "VAL_CONDITION";

/// Validation failure on a single request field.
///
/// `code` is machine-checkable, `field` names the offending input
/// (`where`, `params`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message} ({code})")]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub field: String,
}

impl ValidationError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: field.into(),
        }
    }
}

/// Unified error type for dispatch and DAO operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Resource, row or operation not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid request input
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// Filter condition rejected by the DAO (unknown column, unresolved placeholder)
    #[error("Condition error: {message} ({code})")]
    Condition { code: String, message: String },

    /// Write collides with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed query or payload detected by the DAO
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Query timeout
    #[error("Query timeout after {0}ms")]
    QueryTimeout(u64),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation not supported by this DAO
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DataError {
    /// Create a "not found" error with custom message
    pub fn not_found(msg: impl Into<String>) -> Self {
        DataError::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(
        code: impl Into<String>,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        DataError::Validation(ValidationError::new(code, message, field))
    }

    /// Create a condition error, the kind a DAO signals for a bad filter
    pub fn condition(code: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Condition {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an operation not supported error
    pub fn operation_not_supported(msg: impl Into<String>) -> Self {
        DataError::OperationNotSupported(msg.into())
    }
}

pub type DataResult<T> = std::result::Result<T, DataError>;

/// Wiring mistakes. These are returned synchronously to the caller and never
/// travel through the error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("Parent table is required for replace operations.")]
    ParentTableRequired,

    #[error("Table {0} must declare at least one primary key column.")]
    EmptyPrimaryKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_verbatim() {
        let err = DataError::not_found("Method create not available.");
        assert_eq!(err.to_string(), "Method create not available.");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(VAL_JSON, "expected value", "where");
        assert_eq!(err.to_string(), "where: expected value (VAL_JSON)");
        assert_eq!(
            DataError::Validation(err).to_string(),
            "Validation error: where: expected value (VAL_JSON)"
        );
    }

    #[test]
    fn test_usage_error_message() {
        assert_eq!(
            UsageError::ParentTableRequired.to_string(),
            "Parent table is required for replace operations."
        );
    }
}
