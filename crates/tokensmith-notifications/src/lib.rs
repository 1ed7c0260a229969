//! Anomaly notifications for tokensmith.
//!
//! When a refresh credential is redeemed from a different network origin than
//! the one it was issued to, the rotation engine raises an [`AnomalyEvent`].
//! Delivery is best-effort: events are handed to an [`AnomalyDispatcher`],
//! which queues them on a bounded channel drained by background workers that
//! forward each event to an [`AnomalySink`] (log, webhook or e-mail).

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod types;

pub use adapters::{AnomalySink, EmailSink, LogSink, WebhookSink, sink_from_config};
pub use config::{EmailConfig, NotificationsConfig, SinkKind, WebhookConfig};
pub use dispatcher::{AnomalyDispatcher, AnomalyNotifier};
pub use error::NotificationError;
pub use types::{AnomalyEvent, RenderedContent};
