use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request parameter failed validation. Never retried automatically.
    #[error("Invalid '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Unknown scope '{0}'")]
    UnknownScope(String),

    /// The content store could not be reached. Reads are idempotent, so the
    /// caller may repeat the request verbatim.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The request parameter an error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. } => Some(field),
            AppError::UnknownScope(_) => Some("scope"),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scope_reports_scope_field() {
        let err = AppError::UnknownScope("market".to_string());
        assert_eq!(err.field(), Some("scope"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_store_unavailable_is_retryable() {
        assert!(AppError::StoreUnavailable("down".into()).is_retryable());
        assert!(!AppError::Database("duplicate key".into()).is_retryable());
        assert!(!AppError::validation("page", "must be at least 1").is_retryable());
    }

    #[test]
    fn test_validation_display() {
        let err = AppError::validation("size", "must be between 1 and 100");
        assert_eq!(err.to_string(), "Invalid 'size': must be between 1 and 100");
    }
}
