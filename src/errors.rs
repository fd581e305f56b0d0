use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authorization failed: {0}")]
    AuthorizationFailure(String),

    #[error("database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("no database selected; pass a database name or set DBLINK_DEFAULT_DATABASE")]
    NoDatabaseSelected,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::AuthorizationFailure(detail) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "authorization_failure",
                detail.clone(),
            ),
            AppError::DatabaseNotFound(name) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "database_not_found",
                format!("database '{}' not found", name),
            ),
            AppError::NoDatabaseSelected => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "no_database_selected",
                self.to_string(),
            ),
            AppError::Upstream(e) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream_failed",
                e.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
