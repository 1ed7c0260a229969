//! # tokensmith-auth
//!
//! Refresh-credential lifecycle for tokensmith.
//!
//! This crate provides:
//! - Issuance of an access/refresh credential pair bound to a session
//! - Verification of presented refresh secrets against salted digests
//! - Single-use rotation gated by an atomic conditional revoke
//! - Origin-mismatch detection feeding the anomaly side channel
//! - Axum handlers with cookie transport
//!
//! ## Modules
//!
//! - [`config`] - Token, hashing, cookie and client-origin configuration
//! - [`token`] - Secret generation, access credential codec, rotation engine
//! - [`storage`] - Storage trait for refresh credentials plus an in-memory store
//! - [`types`] - The persistent refresh credential record
//! - [`http`] - Axum HTTP handlers for the issue and refresh endpoints

pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{
    AuthConfig, ClientIpConfig, ConfigError, CookieConfig, HashingConfig, SameSitePolicy, TokenConfig,
};
pub use error::{AuthError, ErrorCategory};
pub use http::{ClientOrigin, TokenState, issue_handler, refresh_handler, token_routes};
pub use storage::{InMemoryRefreshCredentialStorage, RefreshCredentialStorage};
pub use token::{
    AccessClaims, AccessTokenCodec, CredentialPair, JwtError, RotationEngine, SecretHasher,
    TokenLifetimes, generate_refresh_secret,
};
pub use types::RefreshCredentialRecord;

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;
