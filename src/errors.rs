use crate::engine::class_ref::InvalidReference;
use crate::response::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_diesel::InteractError;
use deadpool_diesel::postgres::PoolError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String), // 400

    #[error("Forbidden: {0}")]
    Forbidden(String), // 403

    #[error("Not Found: {0}")]
    NotFound(String), // 404

    #[error("Conflict: {0}")]
    Conflict(String), // 409

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String), // 422

    #[error("Database pool error: {0}")]
    PoolError(#[from] PoolError), // 500

    #[error("Database interaction error: {0}")]
    InteractError(#[from] InteractError), // 500

    #[error("Database query error: {0}")]
    DieselError(#[from] diesel::result::Error), // 404 or 500

    #[error("Internal Server Error: {0}")]
    InternalServerError(#[from] anyhow::Error), // 500
}

impl From<InvalidReference> for AppError {
    fn from(err: InvalidReference) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),

            AppError::DieselError(diesel::result::Error::NotFound) => (
                StatusCode::NOT_FOUND,
                "Resource not found (database query)".to_string(),
            ),

            other => {
                error!("Responding with 500 Internal Server Error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            status_code: status.as_u16(),
            status_message: error_message,
            data: None,
        };

        (status, body).into_response()
    }
}
