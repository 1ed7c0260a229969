//! Client origin extraction.
//!
//! The origin is the TCP peer address. When forwarded headers are trusted,
//! the first `X-Forwarded-For` entry and then `X-Real-IP` take precedence.
//! Header values that are not IP addresses are ignored.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::tokens::TokenState;
use crate::error::AuthError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Textual IP address of the client.
///
/// Requires the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = TokenState::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        resolve_origin(
            &parts.headers,
            peer,
            state.client_ip().trust_forwarded_headers,
        )
        .map(|ip| ClientOrigin(ip.to_string()))
        .ok_or_else(|| AuthError::internal("client address unavailable"))
    }
}

/// Picks the client IP from headers and the peer address.
#[must_use]
pub fn resolve_origin(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_headers: bool,
) -> Option<IpAddr> {
    if trust_forwarded_headers && let Some(ip) = forwarded_ip(headers) {
        return Some(ip.to_canonical());
    }
    peer.map(|addr| addr.ip().to_canonical())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // "client, proxy1, proxy2"
    if let Some(forwarded) = headers.get(X_FORWARDED_FOR)
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
        && let Ok(ip) = first.trim().parse()
    {
        return Some(ip);
    }

    if let Some(real_ip) = headers.get(X_REAL_IP)
        && let Ok(value) = real_ip.to_str()
        && let Ok(ip) = value.trim().parse()
    {
        return Some(ip);
    }

    None
}
