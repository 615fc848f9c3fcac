use thiserror::Error;

use elevate_core::error::CoreError;
use elevate_db::error::{DbError, UniqueField};

use crate::identity::GatewayError;

/// Stable error codes returned to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthenticated,
    Unauthorized,
    ValidationError,
    DuplicateEmail,
    NotFound,
    ProviderError,
    PersistenceError,
    InvalidToken,
    WeakPassword,
    InternalError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::NotFound => "NOT_FOUND",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer errors.
///
/// Messages are safe to show to the actor; raw store and provider errors are
/// logged where they are converted and never carried in the message.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Profile store error: {0}")]
    Persistence(String),

    #[error("Invalid activation token: {0}")]
    InvalidToken(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl ServiceError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::DuplicateEmail(_) => ErrorCode::DuplicateEmail,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Provider(_) => ErrorCode::ProviderError,
            Self::Persistence(_) => ErrorCode::PersistenceError,
            Self::InvalidToken(_) => ErrorCode::InvalidToken,
            Self::WeakPassword(_) => ErrorCode::WeakPassword,
            Self::CasbinError(_) | Self::InvariantViolation(_) => ErrorCode::InternalError,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(UniqueField::Email) => {
                Self::DuplicateEmail("An account with this email already exists".to_string())
            }
            DbError::CoreError(CoreError::ValidationError(msg)) => Self::Validation(msg),
            other => {
                tracing::error!(error = %other, "Profile store failure");
                Self::Persistence("The profile store could not complete the request".to_string())
            }
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::EmailExists => {
                Self::DuplicateEmail("An account with this email already exists".to_string())
            }
            other => {
                tracing::error!(error = %other, "Identity provider failure");
                Self::Provider(other.public_message().to_string())
            }
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => Self::Validation(msg),
            CoreError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            CoreError::ConfigError(msg) => {
                tracing::error!(error = %msg, "Configuration error reached the service layer");
                Self::InvariantViolation("Service misconfigured")
            }
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
