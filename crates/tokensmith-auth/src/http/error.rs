//! Error responses for the token endpoints.
//!
//! Credential failures share one body so callers cannot tell an unknown
//! secret from a revoked, expired or raced one. Server-side details are
//! logged and never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use crate::error::AuthError;

/// Body for every rejected refresh credential.
pub const CREDENTIAL_ERROR_MESSAGE: &str = "invalid or expired refresh token";

/// Body for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);

        if status.is_server_error() {
            error!(category = %self.category(), error = %self, "Token request failed");
        } else {
            debug!(category = %self.category(), error = %self, "Token request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Returns (HTTP status, client-facing message).
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::MissingCredential
        | AuthError::InvalidCredential
        | AuthError::ExpiredCredential
        | AuthError::ConcurrentRotationLost => (
            StatusCode::UNAUTHORIZED,
            CREDENTIAL_ERROR_MESSAGE.to_string(),
        ),
        AuthError::IssuanceFailed { .. }
        | AuthError::Storage { .. }
        | AuthError::Configuration { .. }
        | AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),
    }
}
