use axum::{Json, extract::rejection::BytesRejection, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required and must be a non-empty string")]
    MissingTitle,

    #[error("Title must be a non-empty string")]
    InvalidTitle,

    #[error("Completed must be a boolean")]
    InvalidCompleted,

    #[error("Invalid todo ID")]
    InvalidId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON body")]
    InvalidJson,

    #[error("{}", .0.body_text())]
    Body(#[from] BytesRejection),

    #[error("Todo not found")]
    NotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(StoreError::Database(err))
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::InvalidJson | AppError::Body(_) => {
                ErrorKind::InvalidInput
            }
            AppError::NotFound | AppError::RouteNotFound => ErrorKind::NotFound,
            AppError::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        if let AppError::Body(rejection) = self {
            return rejection.status();
        }
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(e) => {
                error!("store error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
