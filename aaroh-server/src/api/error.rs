//! Error type shared by every API handler.
//!
//! Each variant maps to one HTTP status; the body is always
//! `{"error": "<message>"}`.

use aaroh_core::lifecycle::LifecycleError;
use aaroh_sdk::objects::ErrorResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum ApiError {
    /// No or invalid session / admin credentials.
    Unauthorized(&'static str),
    /// Authenticated but not allowed (CSRF mismatch).
    Forbidden(&'static str),
    NotFound,
    Validation(String),
    /// The order is not in a state that allows the operation.
    NotReady,
    SignatureInvalid,
    /// Amount below the gateway minimum.
    InvalidAmount,
    Conflict,
    Upstream(String),
    Database(sqlx::Error),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::SignatureInvalid => StatusCode::BAD_REQUEST,
            ApiError::NotReady | ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::InvalidAmount => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => {
                (*message).to_string()
            }
            ApiError::NotFound => "resource not found".to_string(),
            ApiError::Validation(message) => message.clone(),
            ApiError::NotReady => "order is not in a state that allows this operation".to_string(),
            ApiError::SignatureInvalid => "signature verification failed".to_string(),
            ApiError::InvalidAmount => "amount is below the payment minimum".to_string(),
            ApiError::Conflict => "conflicting order state".to_string(),
            ApiError::Upstream(_) => "payment provider unavailable".to_string(),
            ApiError::Database(_) | ApiError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "API database error");
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "API internal error");
            }
            ApiError::Upstream(e) => {
                tracing::warn!(error = %e, "Upstream request failed");
            }
            _ => {}
        }
        let body = ErrorResponse {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound => ApiError::NotFound,
            LifecycleError::Validation(message) => ApiError::Validation(message),
            LifecycleError::NotReady => ApiError::NotReady,
            LifecycleError::SignatureInvalid => ApiError::SignatureInvalid,
            LifecycleError::InvalidAmount => ApiError::InvalidAmount,
            LifecycleError::Conflict => ApiError::Conflict,
            LifecycleError::Upstream(e) => ApiError::Upstream(e.to_string()),
            LifecycleError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
