// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{AuthError, PasswordError};
use crate::database::DatabaseError;
use crate::filter::FilterError;

/// Message shown in place of internal error text in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing your request";

/// HTTP API error rendered with the uniform response envelope
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation(String),
    NotFound(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden - the record already exists
    Exists(String),

    // 404 Not Found - no such route
    RouteNotFound(String),

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Exists(_) => 403,
            ApiError::RouteNotFound(_) => 404,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Validation(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Exists(msg) => msg,
            ApiError::RouteNotFound(msg) => msg,
            ApiError::Internal(msg) => msg,
        }
    }

    pub fn is_exists(&self) -> bool {
        matches!(self, ApiError::Exists(_))
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "isSuccess": false,
            "statusCode": self.status_code(),
            "message": self.message(),
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn exists(message: impl Into<String>) -> Self {
        ApiError::Exists(message.into())
    }

    pub fn route_not_found(message: impl Into<String>) -> Self {
        ApiError::RouteNotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::InvalidDocument(msg) => {
                tracing::error!("Stored document does not match its model: {}", msg);
                ApiError::internal(msg)
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenGeneration(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::internal(msg)
            }
            AuthError::PasswordHash(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal(msg)
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => ApiError::validation(err.to_string()),
            PasswordError::Hash(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal(msg)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        // Kept on the response so outer layers can inspect the original error.
        response.extensions_mut().insert(self);
        response
    }
}
