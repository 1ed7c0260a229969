//! Access credential codec.
//!
//! Access credentials are HS512 JWTs signed with a symmetric key injected at
//! construction. The codec is stateless and never consults storage.
//!
//! ## Claims
//!
//! | claim | meaning |
//! |---|---|
//! | `sub` | user id |
//! | `sid` | session-linkage id, stable across rotations |
//! | `origin` | client network origin at signing time |
//! | `iat` / `exp` | issue and expiry, Unix seconds |
//! | `jti` | unique token id |

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::MIN_SIGNING_SECRET_LEN;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Invalid key material.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by an access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: Uuid,

    /// Session-linkage id.
    pub sid: Uuid,

    /// Client origin at signing time.
    pub origin: String,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expires at (Unix seconds).
    pub exp: i64,

    /// Unique token id.
    pub jti: Uuid,
}

impl AccessClaims {
    /// Builds claims issued now and valid for `ttl`.
    #[must_use]
    pub fn new(user_id: Uuid, session_id: Uuid, origin: impl Into<String>, ttl: Duration) -> Self {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: user_id,
            sid: session_id,
            origin: origin.into(),
            iat,
            exp: iat.saturating_add(ttl),
            jti: Uuid::new_v4(),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// HS512 signer and verifier for access credentials.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AccessTokenCodec {
    const ALGORITHM: Algorithm = Algorithm::HS512;

    /// Creates a codec from the shared signing secret.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` if the secret is shorter than 32 bytes.
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(JwtError::invalid_key(format!(
                "signing secret must be at least {} bytes",
                MIN_SIGNING_SECRET_LEN
            )));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Signs a new access credential.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn sign(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        origin: &str,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.encode(&AccessClaims::new(user_id, session_id, origin, ttl))
    }

    /// Encodes pre-built claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn encode(&self, claims: &AccessClaims) -> Result<String, JwtError> {
        encode(&Header::new(Self::ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Verifies signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidSignature`, `JwtError::Expired` or
    /// `JwtError::DecodingError` for anything else malformed.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

#[cfg(test)]
pub(crate) const TEST_SIGNING_SECRET: &[u8] = b"test-signing-secret-0123456789abcdef";
