//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Anything without a more specific mapping; rendered as 500.
    Database(jotter_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<jotter_core::Error> for ApiError {
    fn from(err: jotter_core::Error) -> Self {
        use jotter_core::Error;
        match &err {
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    let friendly_msg = if msg.contains("labels_user_name_unique") {
                        "label with this name already exists".to_string()
                    } else if msg.contains("users_email_key") {
                        "user already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
