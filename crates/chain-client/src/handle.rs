//! # Notification Handle
//!
//! RAII registration: dropping the handle unregisters its subscriber.

use chain_notify::{ChainNotifier, ChainSubscriber};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Handle to an attached subscriber.
///
/// Disconnects the subscriber when [`disconnect`] is called or when the
/// handle is dropped, whichever comes first.
///
/// [`disconnect`]: NotificationHandle::disconnect
pub struct NotificationHandle {
    /// Unique identifier for this attachment (log correlation).
    id: Uuid,
    notifier: ChainNotifier,
    subscriber: Option<Arc<dyn ChainSubscriber>>,
}

impl NotificationHandle {
    pub(crate) fn new(notifier: ChainNotifier, subscriber: Arc<dyn ChainSubscriber>) -> Self {
        Self {
            id: Uuid::new_v4(),
            notifier,
            subscriber: Some(subscriber),
        }
    }

    /// This attachment's identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Unregister the subscriber. Safe to call more than once; also runs
    /// on drop.
    ///
    /// Events notified before this call still reach the subscriber;
    /// events notified after it do not. A `flush` on the hub makes the
    /// cutoff observable.
    pub fn disconnect(&mut self) {
        let Some(subscriber) = self.subscriber.take() else {
            return;
        };
        // Attachment registers through the queue, so the registration
        // task may not have run yet. Unregister both directly (covers
        // the registered case) and through the queue (lands after the
        // registration task in FIFO order, covering the not-yet case).
        // Unregister is idempotent, so doing both is always safe.
        self.notifier.unregister_subscriber(&subscriber);
        let notifier = self.notifier.clone();
        // On a shut-down hub the registry was already cleared.
        let _ = self.notifier.submit_deferred(async move {
            notifier.unregister_subscriber(&subscriber);
        });
        debug!(id = %self.id, "notification handle disconnected");
    }
}

impl Drop for NotificationHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}
