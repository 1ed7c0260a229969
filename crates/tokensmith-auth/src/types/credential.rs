//! Refresh credential record.
//!
//! # Security
//!
//! - Only an Argon2id digest of the secret is persisted, never the secret
//! - The digest is redacted from `Debug` output
//! - Revocation is terminal

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Longest textual IP address (IPv4-mapped IPv6).
pub const MAX_ORIGIN_LEN: usize = 45;

/// Persisted state of one issued refresh secret.
///
/// Every rotation revokes the current record and inserts a new one that
/// carries the same `session_id`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCredentialRecord {
    /// Record identity, used for targeted revocation.
    pub id: Uuid,

    /// Owner of the session.
    pub user_id: Uuid,

    /// Session-linkage id, stable across rotations.
    pub session_id: Uuid,

    /// Argon2id PHC string of the secret.
    pub secret_digest: String,

    /// Client network origin at issuance.
    pub origin: String,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    pub revoked: bool,
}

impl RefreshCredentialRecord {
    /// Creates an active record issued now.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        secret_digest: String,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            secret_digest,
            origin: origin.into(),
            issued_at: OffsetDateTime::now_utc(),
            revoked: false,
        }
    }

    /// Returns the instant after which the record is expired, or `None` if
    /// the lifetime does not fit in a timestamp.
    #[must_use]
    pub fn expires_at(&self, lifetime: Duration) -> Option<OffsetDateTime> {
        let lifetime = time::Duration::try_from(lifetime).ok()?;
        self.issued_at.checked_add(lifetime)
    }

    /// Returns `true` if `issued_at + lifetime` is strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, lifetime: Duration, now: OffsetDateTime) -> bool {
        self.expires_at(lifetime)
            .is_some_and(|expires_at| expires_at < now)
    }

    /// Returns `true` if the record is expired at the current time.
    #[must_use]
    pub fn is_expired(&self, lifetime: Duration) -> bool {
        self.is_expired_at(lifetime, OffsetDateTime::now_utc())
    }
}

impl fmt::Debug for RefreshCredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCredentialRecord")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("secret_digest", &"[REDACTED]")
            .field("origin", &self.origin)
            .field("issued_at", &self.issued_at)
            .field("revoked", &self.revoked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 86_400);

    fn record() -> RefreshCredentialRecord {
        RefreshCredentialRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            "1.2.3.4",
        )
    }

    #[test]
    fn test_new_record_is_active() {
        let record = record();
        assert!(!record.revoked);
        assert!(!record.is_expired(WEEK));
        assert_eq!(record.id.get_version_num(), 4);
    }

    #[test]
    fn test_expired_one_second_past_lifetime() {
        let mut record = record();
        record.issued_at = OffsetDateTime::now_utc() - time::Duration::seconds(7 * 86_400 + 1);
        assert!(record.is_expired(WEEK));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let record = record();
        let exactly_at = record.issued_at + time::Duration::seconds(7 * 86_400);
        assert!(!record.is_expired_at(WEEK, exactly_at));
        assert!(record.is_expired_at(WEEK, exactly_at + time::Duration::nanoseconds(1)));
    }

    #[test]
    fn test_huge_lifetime_never_expires() {
        let record = record();
        assert!(!record.is_expired(Duration::MAX));
    }

    #[test]
    fn test_debug_redacts_digest() {
        let debug = format!("{:?}", record());
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("1.2.3.4"));
    }
}
