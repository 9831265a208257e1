use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use edsetu_core::AppError;
use tracing::{error, warn};

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) | AppError::UnknownPermission(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::DuplicateAssignment(_)
            | AppError::DuplicatePendingInvitation(_)
            | AppError::InvitationNotPending(_) => StatusCode::CONFLICT,
            AppError::InvitationExpired(_) => StatusCode::GONE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::AssignerNotAuthorized(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), detail = self.0.detail(), "request failed");
        } else {
            warn!(code = self.0.code(), detail = self.0.detail(), "request rejected");
        }

        let payload = Json(ErrorResponse::new(
            self.0.code().to_owned(),
            self.0.public_message().to_owned(),
        ));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
