use async_trait::async_trait;
use tracing::warn;

use super::AnomalySink;
use crate::error::NotificationError;
use crate::types::AnomalyEvent;

/// Writes anomaly events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AnomalySink for LogSink {
    async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
        warn!(
            user_id = %event.user_id,
            session_id = %event.session_id,
            record_id = %event.record_id,
            previous_origin = %event.previous_origin,
            new_origin = %event.new_origin,
            "Refresh credential used from a new origin"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
