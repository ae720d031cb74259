//! Error types for the gateway layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use distributed_micro::MicroError;
use serde::Serialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Where in the pipeline a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No token, or the token did not validate.
    Unauthenticated,
    /// Authenticated, but not allowed to touch the resource.
    Forbidden,
    /// The request body or parameters could not be understood.
    BadRequest,
    MethodNotAllowed,
    /// A backend service rejected the primary operation.
    Backend,
    /// A secondary step failed; details stay in the logs.
    Internal,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, StatusCode::UNAUTHORIZED, message)
    }

    pub fn missing_token() -> Self {
        Self::unauthenticated("No token cookie set")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, StatusCode::FORBIDDEN, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed",
        )
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
        )
    }

    /// A backend failure carrying the code the service reported.
    pub fn backend(code: u16, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(code)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(ErrorKind::Backend, status, message)
    }

    /// Translate a failed token validation. A "bad request" from the user
    /// service means the token itself was bad, so it becomes a 401.
    pub fn from_validation(error: MicroError) -> Self {
        if error.code == StatusCode::BAD_REQUEST.as_u16() {
            return Self::unauthenticated(error.error);
        }
        Self::from(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.kind == ErrorKind::MethodNotAllowed {
            return (self.status, Json(json!({}))).into_response();
        }

        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<MicroError> for ApiError {
    fn from(error: MicroError) -> Self {
        error!(error = %error.error, code = error.code, "backend error");
        Self::backend(error.code, error.error)
    }
}
