//! HTTP error mapping
//!
//! Every failure leaves the service as `{"error": {"code", "message"}}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediarank_common::api::ApiAuthError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] ApiAuthError),

    #[error(transparent)]
    Common(#[from] mediarank_common::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        use mediarank_common::Error as E;

        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", e.to_string()),
            ApiError::Common(e) => match e {
                E::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
                E::Authentication(msg) => {
                    (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", msg.clone())
                }
                E::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                E::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                E::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                E::Network(msg) => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR", msg.clone()),
                E::Config(msg) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONFIG_ERROR",
                    msg.clone(),
                ),
                // Store internals stay in the log
                E::Store(_) | E::Serialization(_) | E::Io(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Failed to access saved data".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!(code = code, "Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
