use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::database::StoreError;

#[derive(Debug)]
pub enum AppError {
    /// Self-follow / self-unfollow
    InvalidOperation(String),
    NotFound(String),
    AlreadyExists(String),
    NotFollowing(String),
    InvalidRequest(String),
    Unauthorized(String),
    ServerError(String),
}

impl AppError {
    /// Client-facing text, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidOperation(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::NotFollowing(msg)
            | AppError::InvalidRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::ServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            AppError::NotFollowing(msg) => write!(f, "Not following: {}", msg),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::ServerError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        log::error!("❌ Store failure: {}", err);
        AppError::ServerError("Something went wrong. Please try again later.".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidOperation(_)
            | AppError::AlreadyExists(_)
            | AppError::NotFollowing(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        crate::api::metrics::increment_error_count();
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.message()
        }))
    }
}
