pub mod email;
pub mod log;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{NotificationsConfig, SinkKind};
use crate::error::NotificationError;
use crate::types::AnomalyEvent;

/// Final destination of an anomaly event.
#[async_trait]
pub trait AnomalySink: Send + Sync {
    /// Deliver one event
    async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Builds the sink selected by `config.sink`.
///
/// # Errors
///
/// Returns `NotificationError::InvalidConfig` if the selected sink is missing
/// its settings or they are malformed.
pub fn sink_from_config(
    config: &NotificationsConfig,
) -> Result<Arc<dyn AnomalySink>, NotificationError> {
    match config.sink {
        SinkKind::Log => Ok(Arc::new(LogSink)),
        SinkKind::Webhook => {
            let webhook = config.webhook.as_ref().ok_or_else(|| {
                NotificationError::InvalidConfig("Missing notifications.webhook".into())
            })?;
            Ok(Arc::new(WebhookSink::new(webhook)?))
        }
        SinkKind::Email => {
            let email = config.email.as_ref().ok_or_else(|| {
                NotificationError::InvalidConfig("Missing notifications.email".into())
            })?;
            Ok(Arc::new(EmailSink::new(email)?))
        }
    }
}

pub use email::EmailSink;
pub use log::LogSink;
pub use webhook::WebhookSink;
