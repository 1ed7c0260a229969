//! Issuance and single-use rotation of credential pairs.
//!
//! A rotation revokes the presented record with one conditional update and
//! only answers once that update succeeded. When two requests present the
//! same secret at the same time, both may match the record, but only the one
//! whose revoke flips the flag gets a new pair.
//!
//! ```text
//! rotate(secret, origin)
//!   find_active_match ──none──▶ InvalidCredential
//!   expired? ──yes──▶ ExpiredCredential
//!   origin changed? ──yes──▶ notify (detached)
//!   mint pair (same session_id, nothing stored)
//!   revoke_if_active ──false──▶ ConcurrentRotationLost
//!   insert new record ──err──▶ IssuanceFailed
//!   return pair
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokensmith_notifications::{AnomalyEvent, AnomalyNotifier};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::{AuthConfig, TokenConfig};
use crate::error::AuthError;
use crate::storage::RefreshCredentialStorage;
use crate::token::jwt::AccessTokenCodec;
use crate::token::secret::{SecretHasher, generate_refresh_secret};
use crate::types::RefreshCredentialRecord;

/// Access and refresh lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl From<&TokenConfig> for TokenLifetimes {
    fn from(config: &TokenConfig) -> Self {
        Self {
            access: config.access_token_lifetime,
            refresh: config.refresh_token_lifetime,
        }
    }
}

/// A freshly minted access credential and refresh secret.
#[derive(Clone)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Issues and rotates credential pairs.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct RotationEngine {
    codec: AccessTokenCodec,
    hasher: SecretHasher,
    storage: Arc<dyn RefreshCredentialStorage>,
    notifier: Arc<dyn AnomalyNotifier>,
    lifetimes: TokenLifetimes,
}

impl RotationEngine {
    /// Creates a new rotation engine.
    #[must_use]
    pub fn new(
        codec: AccessTokenCodec,
        hasher: SecretHasher,
        storage: Arc<dyn RefreshCredentialStorage>,
        notifier: Arc<dyn AnomalyNotifier>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            codec,
            hasher,
            storage,
            notifier,
            lifetimes,
        }
    }

    /// Validates `config` and builds the codec and hasher from it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid.
    pub fn from_config(
        config: &AuthConfig,
        storage: Arc<dyn RefreshCredentialStorage>,
        notifier: Arc<dyn AnomalyNotifier>,
    ) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let codec = AccessTokenCodec::new(config.tokens.signing_secret.as_bytes())
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let hasher =
            SecretHasher::new(&config.hashing).map_err(|e| AuthError::configuration(e.to_string()))?;

        Ok(Self::new(
            codec,
            hasher,
            storage,
            notifier,
            TokenLifetimes::from(&config.tokens),
        ))
    }

    #[must_use]
    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    #[must_use]
    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Issues a pair for a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IssuanceFailed` if signing, secret generation,
    /// hashing or persistence fails. The secret is discarded in that case.
    pub async fn issue(&self, user_id: Uuid, origin: &str) -> AuthResult<CredentialPair> {
        let session_id = Uuid::new_v4();
        let (pair, record) = self.mint(user_id, session_id, origin).await?;

        self.storage.insert(&record).await.map_err(|e| {
            error!(%user_id, %session_id, error = %e, "Failed to persist refresh credential");
            AuthError::issuance_failed(format!("failed to persist refresh credential: {}", e))
        })?;

        info!(
            %user_id,
            %session_id,
            record_id = %record.id,
            %origin,
            "Issued credential pair"
        );
        Ok(pair)
    }

    /// Exchanges a refresh secret for a new pair in the same session.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidCredential` if no active record matches
    /// - `AuthError::ExpiredCredential` if the matched record is past its lifetime
    /// - `AuthError::ConcurrentRotationLost` if another request revoked it first
    /// - `AuthError::IssuanceFailed` if minting or persisting the new pair fails
    /// - `AuthError::Storage` if the lookup fails
    pub async fn rotate(&self, presented_secret: &str, origin: &str) -> AuthResult<CredentialPair> {
        let record = self
            .storage
            .find_active_match(presented_secret, &self.hasher)
            .await?
            .ok_or_else(|| {
                debug!(%origin, "Refresh secret matched no active record");
                AuthError::InvalidCredential
            })?;

        if record.is_expired(self.lifetimes.refresh) {
            debug!(
                record_id = %record.id,
                session_id = %record.session_id,
                "Refresh credential expired"
            );
            return Err(AuthError::ExpiredCredential);
        }

        if record.origin != origin {
            warn!(
                user_id = %record.user_id,
                session_id = %record.session_id,
                previous_origin = %record.origin,
                new_origin = %origin,
                "Refresh credential presented from a new origin"
            );
            self.notifier.notify(AnomalyEvent::new(
                record.user_id,
                record.session_id,
                record.id,
                record.origin.clone(),
                origin,
            ));
        }

        let (pair, replacement) = self.mint(record.user_id, record.session_id, origin).await?;

        if !self.storage.revoke_if_active(record.id).await? {
            debug!(
                record_id = %record.id,
                session_id = %record.session_id,
                "Lost rotation race, discarding minted pair"
            );
            return Err(AuthError::ConcurrentRotationLost);
        }

        self.storage.insert(&replacement).await.map_err(|e| {
            error!(
                user_id = %record.user_id,
                session_id = %record.session_id,
                revoked_record_id = %record.id,
                error = %e,
                "Revoked refresh credential but failed to persist its replacement"
            );
            AuthError::issuance_failed(format!("failed to persist refresh credential: {}", e))
        })?;

        info!(
            user_id = %record.user_id,
            session_id = %record.session_id,
            revoked_record_id = %record.id,
            record_id = %replacement.id,
            "Rotated refresh credential"
        );
        Ok(pair)
    }

    /// Signs an access credential and generates a refresh secret with its
    /// record. Nothing is persisted.
    async fn mint(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        origin: &str,
    ) -> AuthResult<(CredentialPair, RefreshCredentialRecord)> {
        let access_token = self
            .codec
            .sign(user_id, session_id, origin, self.lifetimes.access)
            .map_err(|e| AuthError::issuance_failed(format!("failed to sign access token: {}", e)))?;

        let refresh_token = generate_refresh_secret()
            .map_err(|e| AuthError::issuance_failed(e.to_string()))?;

        let digest = self
            .hasher
            .digest(&refresh_token)
            .await
            .map_err(|e| AuthError::issuance_failed(e.to_string()))?;

        let record = RefreshCredentialRecord::new(user_id, session_id, digest, origin);
        Ok((
            CredentialPair {
                access_token,
                refresh_token,
            },
            record,
        ))
    }
}
