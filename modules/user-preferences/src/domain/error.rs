#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    /// A stored record did not match the scope it was read or written under.
    #[error("Isolation violation: {0}")]
    Isolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn isolation(message: impl Into<String>) -> Self {
        Self::Isolation(message.into())
    }
}
