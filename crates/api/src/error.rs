use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use trancendos_core::error::CoreError;
use trancendos_db::DbError;

use crate::auth::password::PasswordError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds transport-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the shape `{ "success": false, "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `trancendos_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage error from `trancendos_db`.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// A password hashing failure.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = serde_json::Map::new();

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => {
                let status = core_status(core);
                match core {
                    CoreError::ValidationFields(errors) => {
                        extra.insert("errors".into(), json!(errors));
                    }
                    CoreError::PermissionDenied { required, current } => {
                        extra.insert("required".into(), json!(required));
                        extra.insert("current".into(), json!(current));
                    }
                    CoreError::RoleLevelDenied { required, current } => {
                        extra.insert("required".into(), json!(required));
                        extra.insert("current".into(), json!(current));
                    }
                    CoreError::InvalidCredentials(reason) => {
                        tracing::warn!(?reason, "Login rejected");
                    }
                    CoreError::InvalidRefreshToken(reason) => {
                        tracing::warn!(?reason, "Refresh rejected");
                    }
                    CoreError::Internal(msg) => {
                        tracing::error!(error = %msg, "Internal core error");
                    }
                    _ => {}
                }
                let message = match core {
                    CoreError::Validation(msg) | CoreError::Conflict(msg) => msg.clone(),
                    CoreError::ValidationFields(_) => "Validation failed".to_string(),
                    CoreError::NotFound { entity, .. } => format!("{entity} not found"),
                    CoreError::Internal(_) => INTERNAL_MESSAGE.to_string(),
                    other => other.to_string(),
                };
                (status, core.code(), message)
            }

            // --- Storage errors ---
            AppError::Database(err) => classify_db_error(err),

            // --- Hashing errors ---
            AppError::Password(err) => {
                tracing::error!(error = %err, "Password hashing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let mut body = serde_json::Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(code.to_string()));
        body.extend(extra);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) | CoreError::ValidationFields(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::TokenMissing
        | CoreError::TokenInvalid
        | CoreError::TokenExpired
        | CoreError::AuthFailed
        | CoreError::AuthRequired
        | CoreError::InvalidCredentials(_)
        | CoreError::InvalidRefreshToken(_) => StatusCode::UNAUTHORIZED,
        CoreError::PermissionDenied { .. }
        | CoreError::RoleLevelDenied { .. }
        | CoreError::OwnershipDenied
        | CoreError::TenantRequired
        | CoreError::TenantAccessDenied => StatusCode::FORBIDDEN,
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Classify a storage error into an HTTP status, error code, and message.
///
/// - Duplicate keys map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_db_error(err: &DbError) -> (StatusCode, &'static str, String) {
    match err {
        DbError::Duplicate(_) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            "Resource already exists".to_string(),
        ),
        DbError::Unavailable(_) => {
            tracing::error!(error = %err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
