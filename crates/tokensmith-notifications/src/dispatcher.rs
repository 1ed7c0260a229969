//! Bounded background dispatch of anomaly events.
//!
//! Callers hand events to [`AnomalyNotifier::notify`], which never waits on
//! delivery. The dispatcher pushes them onto a bounded queue that a fixed
//! number of Tokio workers drain. When the queue is full the event is dropped
//! and logged; callers get no backpressure signal.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::adapters::AnomalySink;
use crate::config::NotificationsConfig;
use crate::types::AnomalyEvent;

/// Fire-and-forget receiver of anomaly events.
///
/// Implementations must return promptly and must not fail the caller.
pub trait AnomalyNotifier: Send + Sync {
    fn notify(&self, event: AnomalyEvent);
}

/// Handle to the background worker pool.
///
/// Cloning the handle shares the same queue. Workers exit once every handle
/// has been dropped and the queue is drained.
#[derive(Clone)]
pub struct AnomalyDispatcher {
    sender: mpsc::Sender<AnomalyEvent>,
}

impl AnomalyDispatcher {
    /// Starts `config.workers` delivery tasks on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn spawn(sink: Arc<dyn AnomalySink>, config: &NotificationsConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for worker in 0..config.workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(event) = next else {
                        break;
                    };
                    if let Err(e) = sink.deliver(&event).await {
                        warn!(
                            worker,
                            sink = sink.name(),
                            user_id = %event.user_id,
                            session_id = %event.session_id,
                            error = %e,
                            "Anomaly notification failed"
                        );
                    }
                }
                debug!(worker, "Anomaly notification worker stopped");
            });
        }

        Self { sender }
    }
}

impl AnomalyNotifier for AnomalyDispatcher {
    fn notify(&self, event: AnomalyEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    user_id = %event.user_id,
                    session_id = %event.session_id,
                    "Anomaly notification queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    user_id = %event.user_id,
                    session_id = %event.session_id,
                    "Anomaly notification workers stopped, dropping event"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Semaphore, mpsc::UnboundedSender};
    use uuid::Uuid;

    struct RecordingSink {
        delivered: UnboundedSender<AnomalyEvent>,
    }

    #[async_trait]
    impl AnomalySink for RecordingSink {
        async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
            let _ = self.delivered.send(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// Waits for a permit before recording each delivery.
    struct GatedSink {
        gate: Arc<Semaphore>,
        delivered: UnboundedSender<AnomalyEvent>,
    }

    #[async_trait]
    impl AnomalySink for GatedSink {
        async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
            let _ = self.delivered.send(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    /// Fails the first delivery and records the rest.
    struct FailsOnceSink {
        attempts: AtomicUsize,
        delivered: UnboundedSender<AnomalyEvent>,
    }

    #[async_trait]
    impl AnomalySink for FailsOnceSink {
        async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(NotificationError::SendFailed("smtp unreachable".to_string()));
            }
            let _ = self.delivered.send(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fails-once"
        }
    }

    fn event(new_origin: &str) -> AnomalyEvent {
        AnomalyEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "1.2.3.4",
            new_origin,
        )
    }

    #[tokio::test]
    async fn test_events_reach_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let dispatcher = AnomalyDispatcher::spawn(
            Arc::new(RecordingSink { delivered: tx }),
            &NotificationsConfig::default(),
        );

        dispatcher.notify(event("9.9.9.9"));
        dispatcher.notify(event("8.8.8.8"));

        let mut origins = Vec::new();
        for _ in 0..2 {
            let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("delivery timed out")
                .expect("sink dropped");
            origins.push(delivered.new_origin);
        }
        origins.sort();
        assert_eq!(origins, vec!["8.8.8.8", "9.9.9.9"]);
    }

    #[tokio::test]
    async fn test_notify_does_not_wait_for_delivery() {
        let gate = Arc::new(Semaphore::new(0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let dispatcher = AnomalyDispatcher::spawn(
            Arc::new(GatedSink {
                gate: Arc::clone(&gate),
                delivered: tx,
            }),
            &NotificationsConfig::default(),
        );

        // Would hang if notify awaited the blocked sink.
        tokio::time::timeout(Duration::from_secs(1), async {
            dispatcher.notify(event("9.9.9.9"));
        })
        .await
        .expect("notify blocked on delivery");

        gate.add_permits(1);
        let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("delivery timed out")
            .expect("sink dropped");
        assert_eq!(delivered.new_origin, "9.9.9.9");
    }

    #[tokio::test]
    async fn test_full_queue_drops_events() {
        let gate = Arc::new(Semaphore::new(0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let config = NotificationsConfig {
            queue_capacity: 1,
            workers: 1,
            ..NotificationsConfig::default()
        };
        let dispatcher = AnomalyDispatcher::spawn(
            Arc::new(GatedSink {
                gate: Arc::clone(&gate),
                delivered: tx,
            }),
            &config,
        );

        for _ in 0..16 {
            dispatcher.notify(event("9.9.9.9"));
        }

        gate.add_permits(16);
        // Workers exit and drop the sink once the last handle is gone and
        // the queue is drained, which closes the channel.
        drop(dispatcher);

        let mut delivered = 0;
        while tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("workers did not drain")
            .is_some()
        {
            delivered += 1;
        }
        assert!(delivered >= 1);
        assert!(
            delivered <= config.queue_capacity + config.workers,
            "delivered {delivered} events past a full queue"
        );
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = Arc::new(FailsOnceSink {
            attempts: AtomicUsize::new(0),
            delivered: tx,
        });
        let config = NotificationsConfig {
            workers: 1,
            ..NotificationsConfig::default()
        };
        let dispatcher =
            AnomalyDispatcher::spawn(Arc::clone(&sink) as Arc<dyn AnomalySink>, &config);

        dispatcher.notify(event("9.9.9.9"));
        dispatcher.notify(event("8.8.8.8"));

        // The only worker must survive the failed first delivery.
        let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("worker stopped after a failed delivery")
            .expect("sink dropped");
        assert_eq!(delivered.new_origin, "8.8.8.8");
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }
}
