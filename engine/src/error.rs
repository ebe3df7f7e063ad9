//! Error types for the chart engine
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the notification surface.

use thiserror::Error;

/// Malformed data reaching the render projection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Record at position {0} has no id")]
    MissingRecordId(usize),

    #[error("Duplicate record id in collection: {0}")]
    DuplicateRecordId(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Task not found: {0}")]
    TodoNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Validation failures are reported inline and never reach the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_as_message() {
        let err = AppError::RecordNotFound("abc".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Record not found: abc\"");
    }

    #[test]
    fn test_validation_flag() {
        assert!(AppError::Validation("Task text is required".into()).is_validation());
        assert!(!AppError::Backend("offline".into()).is_validation());
    }
}
