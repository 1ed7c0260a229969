use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A refresh credential was presented from an unexpected network origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    /// Owner of the session.
    pub user_id: Uuid,

    /// Session-linkage id shared by every credential of the session.
    pub session_id: Uuid,

    /// Record whose secret was presented.
    pub record_id: Uuid,

    /// Origin recorded when the credential was issued.
    pub previous_origin: String,

    /// Origin of the request that presented the credential.
    pub new_origin: String,

    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

impl AnomalyEvent {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        record_id: Uuid,
        previous_origin: impl Into<String>,
        new_origin: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            session_id,
            record_id,
            previous_origin: previous_origin.into(),
            new_origin: new_origin.into(),
            detected_at: OffsetDateTime::now_utc(),
        }
    }

    /// Renders the human-readable warning used by the e-mail sink.
    #[must_use]
    pub fn render(&self) -> RenderedContent {
        RenderedContent {
            subject: "Security warning: session used from a new address".to_string(),
            body: format!(
                "Your session {} was refreshed from IP address {} \
                 (previously {}). If this was not you, sign in again and \
                 review your account activity.",
                self.session_id, self.new_origin, self.previous_origin
            ),
        }
    }
}

/// Rendered notification content
#[derive(Debug, Clone)]
pub struct RenderedContent {
    pub subject: String,
    pub body: String,
}
