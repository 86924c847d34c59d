use validator::ValidationErrors;

/// Raised by the domain constructors when a draft cannot become an entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DomainError {
    pub fn invalid_field<T: Into<String>>(field: &'static str, reason: T) -> Self {
        DomainError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Unwraps a draft member that validation already marked as required.
pub(crate) fn require<T>(value: Option<T>, field: &'static str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::invalid_field(field, "missing required field"))
}
