//! Refresh credential storage.
//!
//! One row per issued refresh secret. Rows are never deleted; rotation flips
//! `revoked` with a conditional update so concurrent rotations of the same
//! row have a single winner.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use tokensmith_auth::types::{MAX_ORIGIN_LEN, RefreshCredentialRecord};
use uuid::Uuid;

use crate::{PgPool, StorageError, StorageResult};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS refresh_credentials (
        id            UUID PRIMARY KEY,
        user_id       UUID NOT NULL,
        session_id    UUID NOT NULL,
        secret_digest TEXT NOT NULL,
        origin        VARCHAR(45) NOT NULL,
        issued_at     TIMESTAMPTZ NOT NULL,
        revoked       BOOLEAN NOT NULL DEFAULT FALSE
    )
"#;

const CREATE_ACTIVE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS refresh_credentials_active_idx
        ON refresh_credentials (issued_at)
        WHERE revoked = FALSE
"#;

// =============================================================================
// Types
// =============================================================================

type RowTuple = (Uuid, Uuid, Uuid, String, String, OffsetDateTime, bool);

/// Refresh credential row from database.
#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub secret_digest: String,
    pub origin: String,
    pub issued_at: OffsetDateTime,
    pub revoked: bool,
}

impl CredentialRow {
    /// Create from database tuple.
    fn from_tuple(row: RowTuple) -> Self {
        Self {
            id: row.0,
            user_id: row.1,
            session_id: row.2,
            secret_digest: row.3,
            origin: row.4,
            issued_at: row.5,
            revoked: row.6,
        }
    }
}

impl From<CredentialRow> for RefreshCredentialRecord {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            session_id: row.session_id,
            secret_digest: row.secret_digest,
            origin: row.origin,
            issued_at: row.issued_at,
            revoked: row.revoked,
        }
    }
}

// =============================================================================
// Credential Storage
// =============================================================================

/// Refresh credential storage operations.
pub struct CredentialStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> CredentialStorage<'a> {
    /// Create a new credential storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and the partial index over active rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        query(CREATE_TABLE).execute(self.pool).await?;
        query(CREATE_ACTIVE_INDEX).execute(self.pool).await?;
        Ok(())
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an oversized origin,
    /// `StorageError::Conflict` for a duplicate id, or a database error.
    pub async fn insert(&self, record: &RefreshCredentialRecord) -> StorageResult<()> {
        validate_origin(&record.origin)?;

        query(
            r#"
            INSERT INTO refresh_credentials
                (id, user_id, session_id, secret_digest, origin, issued_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.session_id)
        .bind(&record.secret_digest)
        .bind(&record.origin)
        .bind(record.issued_at)
        .bind(record.revoked)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!(
                    "refresh credential '{}' already exists",
                    record.id
                ));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }

    /// List all non-revoked rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> StorageResult<Vec<CredentialRow>> {
        let rows: Vec<RowTuple> = query_as(
            r#"
            SELECT id, user_id, session_id, secret_digest, origin, issued_at, revoked
            FROM refresh_credentials
            WHERE revoked = FALSE
            ORDER BY issued_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CredentialRow::from_tuple).collect())
    }

    /// Find a row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<CredentialRow>> {
        let row: Option<RowTuple> = query_as(
            r#"
            SELECT id, user_id, session_id, secret_digest, origin, issued_at, revoked
            FROM refresh_credentials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CredentialRow::from_tuple))
    }

    /// Revoke the row if it is still active.
    ///
    /// Returns `true` only when this statement flipped the flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_if_active(&self, id: Uuid) -> StorageResult<bool> {
        let result = query(
            r#"
            UPDATE refresh_credentials
            SET revoked = TRUE
            WHERE id = $1
              AND revoked = FALSE
            "#,
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn validate_origin(origin: &str) -> StorageResult<()> {
    if origin.len() > MAX_ORIGIN_LEN {
        return Err(StorageError::invalid_input(format!(
            "origin longer than {} characters",
            MAX_ORIGIN_LEN
        )));
    }
    Ok(())
}
