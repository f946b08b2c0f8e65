use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::mail::Mailer;
use crate::session::repository::SessionRepository;
use crate::session::token::TokenConfig;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub session_repository: Arc<dyn SessionRepository + Send + Sync>,
    pub token_config: TokenConfig,
    pub mailer: Arc<dyn Mailer>,
    pub backend_url: String,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
        mailer: Arc<dyn Mailer>,
        backend_url: String,
    ) -> Self {
        Self {
            user_repository,
            session_repository,
            token_config,
            mailer,
            backend_url,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Config errors abort startup; reaching here means something is
            // badly wired, so answer like any other server fault.
            AppError::Config(msg) => {
                error!(reason = %msg, "configuration error surfaced at runtime");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::Database(msg) => {
                error!(reason = %msg, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("database error: {}", msg),
                )
            }
            AppError::Internal(msg) => {
                error!(reason = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
