use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error("no session secret configured and none found in '{0}'")]
    MissingSecret(PathBuf),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Service(#[from] ServiceError),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Cors(#[from] rocket_cors::Error),
}

/// Failures of the classroom operations, shared by every service module.
///
/// The HTTP layer renders each variant as a problem document, see
/// [`crate::resp::problem::Problem`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{kind} doesn't exist.")]
    NotFound { kind: &'static str, id: Uuid },
    #[error("{0}")]
    Conflict(String),
    /// Class is missing or not owned by the caller.
    #[error("Invalid class.")]
    InvalidClass,
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    #[inline]
    pub fn not_found(kind: &'static str, id: Uuid) -> ServiceError {
        ServiceError::NotFound { kind, id }
    }

    #[inline]
    pub fn forbidden(detail: impl ToString) -> ServiceError {
        ServiceError::Forbidden(detail.to_string())
    }
}

impl From<bcrypt::BcryptError> for ServiceError {
    fn from(e: bcrypt::BcryptError) -> Self {
        ServiceError::Internal(format!("password hashing failed: {}", e))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
