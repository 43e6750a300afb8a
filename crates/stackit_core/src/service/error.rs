//! Error taxonomy shared by all forum services.

use crate::model::validation::ModelValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case level failure.
///
/// Every variant maps to one stable [`ServiceError::code`] that outer layers
/// can translate into transport status codes.
#[derive(Debug)]
pub enum ServiceError {
    /// Input breaks a field or value rule.
    Validation(String),
    /// Entity is absent or soft-deleted.
    NotFound { entity: &'static str, id: String },
    /// Actor is not allowed to perform the operation.
    Permission(String),
    /// Uniqueness violation that could not be resolved.
    Conflict(String),
    /// Storage failure unrelated to the request itself.
    Persistence(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Permission(_) => "permission_denied",
            Self::Conflict(_) => "conflict",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Permission(message) => write!(f, "permission denied: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for ServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::validation::ModelValidationError;
    use crate::repo::RepoError;

    #[test]
    fn repo_errors_map_onto_taxonomy() {
        let not_found: ServiceError = RepoError::not_found("question", "q-1").into();
        assert!(matches!(
            not_found,
            ServiceError::NotFound { entity: "question", ref id } if id == "q-1"
        ));
        assert_eq!(not_found.code(), "not_found");

        let conflict: ServiceError = RepoError::Conflict("dup".to_string()).into();
        assert_eq!(conflict.code(), "conflict");

        let invalid: ServiceError = RepoError::InvalidData("bad row".to_string()).into();
        assert!(matches!(invalid, ServiceError::Persistence(_)));
    }

    #[test]
    fn validation_errors_keep_message() {
        let err: ServiceError = ModelValidationError::Blank("title").into();
        assert_eq!(err.code(), "validation");
        assert_eq!(err.to_string(), "validation failed: title cannot be empty");
    }
}
