use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from external API";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No authentication token found")]
    Unauthenticated,

    #[error("Authorization header is required")]
    MissingAuthorization,

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Remote { status: StatusCode, message: String },

    #[error("Invalid response from external API (status {status})")]
    InvalidResponse { status: StatusCode },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("{0}")]
    Forward(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Status code the remote service answered with, if the failure came from it.
    pub fn remote_status(&self) -> Option<StatusCode> {
        match self {
            AppError::Remote { status, .. } | AppError::InvalidResponse { status } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated | AppError::MissingAuthorization => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Remote { status, message } => (status, message),
            AppError::InvalidResponse { .. } => {
                (StatusCode::BAD_GATEWAY, INVALID_RESPONSE_MESSAGE.to_string())
            }
            AppError::Forward(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
            other => {
                error!("internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
