use serde::Serialize;
use thiserror::Error;

/// Failure of a whole refresh cycle; the previously published snapshot stays in place
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RefreshError {
    #[error("refresh worker failed: {0}")]
    Worker(String),
    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

/// One rejected search parameter
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("invalid search parameters: {}", .0.iter().map(|e| e.field.as_str()).collect::<Vec<_>>().join(", "))]
    Validation(Vec<FieldError>),
}

impl QueryError {
    pub fn details(&self) -> &[FieldError] {
        match self {
            QueryError::Validation(details) => details,
        }
    }
}
