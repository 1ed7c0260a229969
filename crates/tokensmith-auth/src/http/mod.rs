//! Axum HTTP handlers for credential issuance and rotation.
//!
//! # Endpoints
//!
//! - `GET /auth/tokens?user_id=<uuid>` - issue a pair for a new session
//! - `GET /auth/refresh` - rotate the `refresh_token` cookie
//!
//! Both set the access and refresh cookies on success.

pub mod error;
pub mod origin;
pub mod tokens;

use axum::{Router, routing::get};

pub use origin::ClientOrigin;
pub use tokens::{TokenState, issue_handler, refresh_handler};

/// Routes for the token endpoints.
pub fn token_routes() -> Router<TokenState> {
    Router::new()
        .route("/auth/tokens", get(issue_handler))
        .route("/auth/refresh", get(refresh_handler))
}
