//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::engine::BalancingResult;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Malformed input, retry with corrected request
    ValidationError(String),

    // Rejected configuration update, prior config retained
    ConfigError(String),

    // Balancing pass failed; carries the safe fallback result
    EngineError {
        message: String,
        fallback: Box<BalancingResult>,
    },
}

impl AppError {
    /// Machine-readable category so callers can tell bad input from faults
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::ConfigError(_) => "config",
            AppError::EngineError { .. } => "engine",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, body) = match self {
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "kind": kind, "status": 400 }),
            ),
            AppError::ConfigError(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": msg, "kind": kind, "status": 422 }),
            ),
            AppError::EngineError { message, fallback } => {
                tracing::error!("Engine error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Balancing engine failure",
                        "detail": message,
                        "kind": kind,
                        "status": 500,
                        "fallback": fallback,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl From<crate::settings::ConfigError> for AppError {
    fn from(err: crate::settings::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}
