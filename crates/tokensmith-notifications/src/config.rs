//! Notification dispatch configuration.

use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// Where anomaly events end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Write a `warn` log line.
    #[default]
    Log,
    /// POST a JSON payload to a webhook.
    Webhook,
    /// Send an e-mail over SMTP.
    Email,
}

/// Notification configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [notifications]
/// sink = "webhook"
/// queue_capacity = 256
/// workers = 2
///
/// [notifications.webhook]
/// url = "https://alerts.example.com/hooks/session"
/// secret = "shared-hmac-secret"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Maximum number of queued events. Events beyond this are dropped.
    pub queue_capacity: usize,

    /// Number of background delivery workers.
    pub workers: usize,

    /// Selected sink.
    pub sink: SinkKind,

    pub webhook: Option<WebhookConfig>,

    pub email: Option<EmailConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            workers: 2,
            sink: SinkKind::Log,
            webhook: None,
            email: None,
        }
    }
}

/// Webhook sink settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub url: String,

    /// HMAC-SHA256 key for the `X-Signature-256` header.
    #[serde(default)]
    pub secret: Option<String>,
}

/// SMTP sink settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    pub from: String,

    /// Security mailbox that receives the warnings.
    pub to: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl NotificationsConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::InvalidConfig` when the pool is sized to
    /// zero or the selected sink has no settings section.
    pub fn validate(&self) -> Result<(), NotificationError> {
        if self.queue_capacity == 0 {
            return Err(NotificationError::InvalidConfig(
                "queue_capacity must be > 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(NotificationError::InvalidConfig(
                "workers must be > 0".to_string(),
            ));
        }
        match self.sink {
            SinkKind::Log => {}
            SinkKind::Webhook => match &self.webhook {
                Some(webhook) if !webhook.url.is_empty() => {}
                _ => {
                    return Err(NotificationError::InvalidConfig(
                        "sink = \"webhook\" requires notifications.webhook.url".to_string(),
                    ));
                }
            },
            SinkKind::Email => {
                if self.email.is_none() {
                    return Err(NotificationError::InvalidConfig(
                        "sink = \"email\" requires a notifications.email section".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = NotificationsConfig::default();
        assert_eq!(config.sink, SinkKind::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_fails_validation() {
        let config = NotificationsConfig {
            workers: 0,
            ..NotificationsConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_webhook_sink_requires_url() {
        let config = NotificationsConfig {
            sink: SinkKind::Webhook,
            ..NotificationsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = NotificationsConfig {
            sink: SinkKind::Webhook,
            webhook: Some(WebhookConfig {
                url: "https://alerts.example.com/hook".to_string(),
                secret: None,
            }),
            ..NotificationsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sink_kind_deserializes_lowercase() {
        let config: NotificationsConfig =
            serde_json::from_str(r#"{"sink": "email", "email": {"smtp_host": "smtp.example.com", "from": "noreply@example.com", "to": "security@example.com"}}"#)
                .unwrap();
        assert_eq!(config.sink, SinkKind::Email);
        assert_eq!(config.email.unwrap().smtp_port, 587);
        assert_eq!(config.queue_capacity, 256);
    }
}
