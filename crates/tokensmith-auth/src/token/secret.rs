//! Refresh secret generation and verification.
//!
//! # Security
//!
//! - Secrets are 256-bit random values from the OS CSPRNG, base64url encoded
//! - Digests are Argon2id PHC strings with a fresh random salt
//! - Verification compares the derived hash in constant time
//!
//! Hashing is CPU-bound. The async entry points run it on Tokio's blocking
//! pool so request tasks are not stalled.

use argon2::{
    Algorithm, Argon2, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::AuthResult;
use crate::config::{ConfigError, HashingConfig};
use crate::error::AuthError;
use crate::types::RefreshCredentialRecord;

/// Number of random bytes in a refresh secret.
pub const SECRET_BYTES: usize = 32;

/// Generates a new refresh secret.
///
/// # Format
///
/// 32 random bytes, base64url without padding (43 characters).
///
/// # Errors
///
/// Returns `AuthError::Internal` if the OS entropy source fails.
pub fn generate_refresh_secret() -> AuthResult<String> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::internal(format!("entropy source failed: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Argon2id digest and verification of refresh secrets.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Creates a hasher with the configured cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if Argon2 rejects the parameters.
    pub fn new(config: &HashingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, config.params()?),
        })
    }

    /// Hashes `secret` into a PHC string with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if hashing fails.
    pub fn digest_blocking(&self, secret: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::internal(format!("hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Returns `true` if `candidate` hashes to `digest`.
    ///
    /// A malformed digest verifies as `false`.
    #[must_use]
    pub fn verify_blocking(&self, digest: &str, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Malformed refresh credential digest");
                return false;
            }
        };
        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hashes `secret` on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if hashing fails or the blocking task panics.
    pub async fn digest(&self, secret: &str) -> AuthResult<String> {
        let hasher = self.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hasher.digest_blocking(&secret))
            .await
            .map_err(|e| AuthError::internal(format!("hashing task failed: {}", e)))?
    }

    /// Returns the first candidate whose digest matches `secret`.
    ///
    /// All candidates are checked on a single blocking-pool hop.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the blocking task panics.
    pub async fn find_match(
        &self,
        candidates: Vec<RefreshCredentialRecord>,
        secret: &str,
    ) -> AuthResult<Option<RefreshCredentialRecord>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let hasher = self.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .find(|record| hasher.verify_blocking(&record.secret_digest, &secret))
        })
        .await
        .map_err(|e| AuthError::internal(format!("verification task failed: {}", e)))
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> SecretHasher {
    SecretHasher::new(&HashingConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_generate_format() {
        let secret = generate_refresh_secret().unwrap();
        assert_eq!(secret.len(), 43);
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(URL_SAFE_NO_PAD.decode(&secret).unwrap().len(), SECRET_BYTES);
    }

    #[test]
    fn test_generate_unique() {
        let a = generate_refresh_secret().unwrap();
        let b = generate_refresh_secret().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_verifies() {
        let hasher = test_hasher();
        let secret = generate_refresh_secret().unwrap();
        let digest = hasher.digest_blocking(&secret).unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains(&secret));
        assert!(hasher.verify_blocking(&digest, &secret));
    }

    #[test]
    fn test_digest_is_salted() {
        let hasher = test_hasher();
        let secret = generate_refresh_secret().unwrap();
        let a = hasher.digest_blocking(&secret).unwrap();
        let b = hasher.digest_blocking(&secret).unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify_blocking(&a, &secret));
        assert!(hasher.verify_blocking(&b, &secret));
    }

    #[test]
    fn test_other_secret_rejected() {
        let hasher = test_hasher();
        let s1 = generate_refresh_secret().unwrap();
        let s2 = generate_refresh_secret().unwrap();
        let digest = hasher.digest_blocking(&s1).unwrap();

        assert!(!hasher.verify_blocking(&digest, &s2));
        assert!(!hasher.verify_blocking(&digest, &s1[..42]));
        assert!(!hasher.verify_blocking(&digest, &format!("{}x", s1)));
        assert!(!hasher.verify_blocking(&digest, ""));
    }

    #[test]
    fn test_malformed_digest_is_false() {
        let hasher = test_hasher();
        assert!(!hasher.verify_blocking("not-a-phc-string", "anything"));
        assert!(!hasher.verify_blocking("", ""));
    }

    #[test]
    fn test_verify_uses_digest_parameters() {
        // A digest produced with other costs still verifies.
        let cheap = test_hasher();
        let other = SecretHasher::new(&HashingConfig {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let digest = other.digest_blocking("secret").unwrap();
        assert!(cheap.verify_blocking(&digest, "secret"));
    }

    #[tokio::test]
    async fn test_find_match_picks_the_right_record() {
        let hasher = test_hasher();
        let wanted = generate_refresh_secret().unwrap();

        let mut candidates = Vec::new();
        for _ in 0..3 {
            let other = generate_refresh_secret().unwrap();
            candidates.push(RefreshCredentialRecord::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                hasher.digest(&other).await.unwrap(),
                "1.2.3.4",
            ));
        }
        let target = RefreshCredentialRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            hasher.digest(&wanted).await.unwrap(),
            "1.2.3.4",
        );
        let target_id = target.id;
        candidates.insert(1, target);

        let found = hasher.find_match(candidates, &wanted).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(target_id));
    }

    #[tokio::test]
    async fn test_find_match_empty() {
        let hasher = test_hasher();
        assert!(hasher.find_match(Vec::new(), "x").await.unwrap().is_none());
    }
}
