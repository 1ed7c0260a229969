//! Issue and refresh endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::origin::ClientOrigin;
use crate::AuthResult;
use crate::config::{ClientIpConfig, CookieConfig};
use crate::error::AuthError;
use crate::token::{CredentialPair, RotationEngine};

/// State required for the token endpoints.
#[derive(Clone)]
pub struct TokenState {
    engine: Arc<RotationEngine>,
    cookies: Arc<CookieConfig>,
    client_ip: ClientIpConfig,
}

impl TokenState {
    /// Creates a new token state.
    #[must_use]
    pub fn new(engine: Arc<RotationEngine>, cookies: CookieConfig, client_ip: ClientIpConfig) -> Self {
        Self {
            engine,
            cookies: Arc::new(cookies),
            client_ip,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<RotationEngine> {
        &self.engine
    }

    #[must_use]
    pub fn client_ip(&self) -> ClientIpConfig {
        self.client_ip
    }

    /// Adds both credential cookies to the jar.
    fn set_credential_cookies(&self, jar: CookieJar, pair: CredentialPair) -> CookieJar {
        let lifetimes = self.engine.lifetimes();
        jar.add(
            self.cookies
                .build_cookie(&self.cookies.access_name, pair.access_token, lifetimes.access),
        )
        .add(self.cookies.build_cookie(
            &self.cookies.refresh_name,
            pair.refresh_token,
            lifetimes.refresh,
        ))
    }
}

/// Query parameters of the issue endpoint.
#[derive(Debug, Deserialize)]
pub struct IssueParams {
    pub user_id: Option<String>,
}

/// Issues a credential pair for a new session.
///
/// `GET /auth/tokens?user_id=<uuid>`
pub async fn issue_handler(
    State(state): State<TokenState>,
    ClientOrigin(origin): ClientOrigin,
    Query(params): Query<IssueParams>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    let user_id = params
        .user_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| AuthError::invalid_request("invalid user identifier"))?;

    debug!(%user_id, %origin, "Processing issue request");
    let pair = state.engine.issue(user_id, &origin).await?;

    Ok((
        state.set_credential_cookies(jar, pair),
        Json(json!({ "message": "Tokens issued successfully" })),
    ))
}

/// Rotates the refresh credential carried in the refresh cookie.
///
/// `GET /auth/refresh`
pub async fn refresh_handler(
    State(state): State<TokenState>,
    ClientOrigin(origin): ClientOrigin,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    let presented = jar
        .get(&state.cookies.refresh_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    debug!(%origin, "Processing refresh request");
    let pair = state.engine.rotate(&presented, &origin).await?;

    Ok((
        state.set_credential_cookies(jar, pair),
        Json(json!({ "message": "Tokens refreshed successfully" })),
    ))
}
