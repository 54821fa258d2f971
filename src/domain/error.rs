use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("field `{field}` is not part of the response schema")]
    UnknownField { field: String },
    #[error("value does not fit field `{field}`")]
    InvalidValue { field: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
        }
    }
}
