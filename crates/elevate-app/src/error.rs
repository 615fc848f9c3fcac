use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Writer, async_trait};
use serde::Serialize;
use thiserror::Error;

use elevate_service::error::{ErrorCode, ServiceError};

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] elevate_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] elevate_core::error::CoreError),

    /// Request body or query could not be parsed.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

#[must_use]
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError
        | ErrorCode::DuplicateEmail
        | ErrorCode::InvalidToken
        | ErrorCode::WeakPassword => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthenticated | ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ProviderError | ErrorCode::PersistenceError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// Converts to the response body. Service messages are already safe for
    /// the caller; anything from below the service layer is replaced.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::ServiceError(e) => {
                let code = e.code();
                let error = if code == ErrorCode::InternalError {
                    "Internal server error".to_string()
                } else {
                    e.to_string()
                };
                ErrorResponse { error, code }
            }
            Self::BadRequest(msg) => ErrorResponse {
                error: format!("Invalid request: {msg}"),
                code: ErrorCode::ValidationError,
            },
            Self::DatabaseError(_) | Self::CoreError(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                code: ErrorCode::InternalError,
            },
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let body = self.to_response();
        let status = status_for(body.code);

        if status.is_server_error() {
            tracing::error!(error = %self, code = %body.code, path = %req.uri().path(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = %body.code, path = %req.uri().path(), "Request rejected");
        }

        res.status_code(status);
        res.render(Json(body));
    }
}
