use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Uniform error envelope. Every failure carries a machine-readable code,
/// a human-readable message, and optional field-level details.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    Unauthorized,

    Forbidden,

    NotFound(String),

    InvalidCredentials,

    RecaptchaFailed,

    InvalidAdminCode,

    CannotDeleteSelf,

    FileNotFound,

    /// Auth throttle block; renders as a static HTML page, not JSON
    RateLimited {
        ip: String,
    },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation { message, .. } => write!(f, "Validation error: {}", message),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::RecaptchaFailed => write!(f, "Human verification failed"),
            ApiError::InvalidAdminCode => write!(f, "Invalid admin code"),
            ApiError::CannotDeleteSelf => write!(f, "Cannot delete own account"),
            ApiError::FileNotFound => write!(f, "Stored file not found"),
            ApiError::RateLimited { ip } => write!(f, "Rate limited: {}", ip),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::RateLimited { ip } = &self {
            let content = format!(
                "<!DOCTYPE html><html><head><title>403 Forbidden</title></head>\
                 <body style=\"background:#fff;color:#111;font-family:Arial,sans-serif;\
                 text-align:center;padding-top:10vh;\"><h1>403 Forbidden</h1>\
                 <p>IP: {ip}</p></body></html>"
            );
            return (
                StatusCode::FORBIDDEN,
                [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
                content,
            )
                .into_response();
        }

        let (status, code, message, details) = match self {
            ApiError::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                details,
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Insufficient privileges".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Email or password is incorrect".to_string(),
                None,
            ),
            ApiError::RecaptchaFailed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "recaptcha_failed",
                "Human verification failed".to_string(),
                None,
            ),
            ApiError::InvalidAdminCode => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_admin_code",
                "Admin code is incorrect".to_string(),
                None,
            ),
            ApiError::CannotDeleteSelf => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "cannot_delete_self",
                "An account cannot delete itself".to_string(),
                None,
            ),
            ApiError::FileNotFound => (
                StatusCode::NOT_FOUND,
                "file_not_found",
                "Stored file not found".to_string(),
                None,
            ),
            ApiError::RateLimited { .. } => unreachable!("handled above"),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            code,
            message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation {
            message: msg.into(),
            details: None,
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
