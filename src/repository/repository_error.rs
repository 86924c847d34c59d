use std::fmt;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound(String),
    AlreadyExists(String),
    ValidationError(String),
    DatabaseError(String),
    ConnectionError(String),
    SerializationError(String),
    /// A concurrent transaction touched the same documents; the caller may retry.
    TransactionConflict(String),
    /// Driver errors with no more specific classification
    Generic(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RepositoryError::AlreadyExists(msg) => write!(f, "Already Exists: {}", msg),
            RepositoryError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            RepositoryError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            RepositoryError::ConnectionError(msg) => write!(f, "Connection Error: {}", msg),
            RepositoryError::SerializationError(msg) => write!(f, "Serialization Error: {}", msg),
            RepositoryError::TransactionConflict(msg) => write!(f, "Transaction Conflict: {}", msg),
            RepositoryError::Generic(err) => write!(f, "Repository Error: {}", err),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Generic(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl RepositoryError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        RepositoryError::NotFound(msg.into())
    }

    pub fn already_exists<T: Into<String>>(msg: T) -> Self {
        RepositoryError::AlreadyExists(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        RepositoryError::ValidationError(msg.into())
    }

    pub fn database<T: Into<String>>(msg: T) -> Self {
        RepositoryError::DatabaseError(msg.into())
    }

    pub fn connection<T: Into<String>>(msg: T) -> Self {
        RepositoryError::ConnectionError(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        RepositoryError::SerializationError(msg.into())
    }

    pub fn transaction_conflict<T: Into<String>>(msg: T) -> Self {
        RepositoryError::TransactionConflict(msg.into())
    }
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, TRANSIENT_TRANSACTION_ERROR};

        if err.contains_label(TRANSIENT_TRANSACTION_ERROR) {
            return RepositoryError::TransactionConflict(format!("Transient transaction error: {}", err));
        }

        match err.kind.as_ref() {
            ErrorKind::Write(_) => {
                // duplicate key (E11000) on the unique email / licensePlate indexes
                let err_msg = err.to_string();
                if err_msg.contains("E11000") {
                    RepositoryError::AlreadyExists(format!("Duplicate key: {}", err))
                } else {
                    RepositoryError::DatabaseError(format!("Write error: {}", err))
                }
            }
            ErrorKind::Command(command) if command.code_name == "WriteConflict" => {
                RepositoryError::TransactionConflict(format!("Write conflict: {}", err))
            }
            ErrorKind::Authentication { .. } => {
                RepositoryError::ConnectionError(format!("Authentication failed: {}", err))
            }
            ErrorKind::InvalidArgument { .. } => {
                RepositoryError::ValidationError(format!("Invalid argument: {}", err))
            }
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } => {
                RepositoryError::ConnectionError(format!("IO error: {}", err))
            }
            _ => RepositoryError::Generic(Box::new(err)),
        }
    }
}

impl From<crate::model::DomainError> for RepositoryError {
    fn from(err: crate::model::DomainError) -> Self {
        RepositoryError::ValidationError(err.to_string())
    }
}

impl From<bson::ser::Error> for RepositoryError {
    fn from(err: bson::ser::Error) -> Self {
        RepositoryError::SerializationError(format!("BSON serialization error: {}", err))
    }
}

impl From<bson::de::Error> for RepositoryError {
    fn from(err: bson::de::Error) -> Self {
        RepositoryError::SerializationError(format!("BSON deserialization error: {}", err))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            RepositoryError::not_found("listing ABC-123").to_string(),
            "Not Found: listing ABC-123"
        );
        assert_eq!(
            RepositoryError::transaction_conflict("listing busy").to_string(),
            "Transaction Conflict: listing busy"
        );
    }

    #[test]
    fn test_driver_error_classification() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RepositoryError::from(mongodb::error::Error::from(refused));
        assert!(matches!(err, RepositoryError::ConnectionError(_)));

        let bad_reply = bson::from_document::<crate::model::ClientDocument>(bson::doc! { "email": 5 }).unwrap_err();
        let err = RepositoryError::from(mongodb::error::Error::from(bad_reply));
        assert!(matches!(err, RepositoryError::Generic(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bson_errors_become_serialization_errors() {
        let err = bson::from_document::<crate::model::ClientDocument>(bson::doc! { "email": 5 }).unwrap_err();
        assert!(matches!(RepositoryError::from(err), RepositoryError::SerializationError(_)));
    }
}
