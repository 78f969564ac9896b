//! # Subscriber Attachment
//!
//! Attaching an observer to a running node has a consistency problem:
//! between reading node state and registering the subscriber, events
//! keep flowing, so a naive attach either misses transactions or sees
//! them twice.
//!
//! [`attach_notifications`] solves it with the queue's own ordering:
//! snapshot the mempool first, then submit the registration as a queued
//! task that replays the snapshot and registers the subscriber. Events
//! enqueued before the snapshot dispatch before that task, while the
//! subscriber is not yet registered; events enqueued after it dispatch
//! once it is. The subscriber observes the snapshot, then exactly the
//! post-snapshot events: no gap, no duplicate.

use chain_notify::{ChainNotifier, ChainSubscriber, QueueClosed};
use chain_types::Hash;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::handle::NotificationHandle;
use crate::views::{ChainView, MempoolView};

/// Errors from attaching a subscriber.
#[derive(Debug, Error)]
pub enum AttachError {
    /// The hub is shut down; no attachments accepted.
    #[error("notification hub is closed")]
    HubClosed(#[from] QueueClosed),
}

/// Attach a subscriber with a consistent view of the mempool.
///
/// The caller must hold its consistency domain stable across this call
/// (see [`MempoolView::snapshot`]); the queue's FIFO order does the rest.
/// The snapshot is replayed to the subscriber as `on_transaction_added`
/// callbacks before any live event reaches it.
pub fn attach_notifications(
    notifier: &ChainNotifier,
    mempool: &dyn MempoolView,
    subscriber: Arc<dyn ChainSubscriber>,
) -> Result<NotificationHandle, AttachError> {
    let snapshot = mempool.snapshot();
    let handle = NotificationHandle::new(notifier.clone(), Arc::clone(&subscriber));
    let id = handle.id();
    let hub = notifier.clone();
    notifier.submit_deferred(async move {
        debug!(
            id = %id,
            snapshot_len = snapshot.len(),
            "replaying mempool snapshot to new subscriber"
        );
        for tx in snapshot {
            subscriber.on_transaction_added(tx).await;
        }
        hub.register_subscriber(subscriber);
    })?;
    debug!(id = %id, "subscriber attachment queued");
    Ok(handle)
}

/// Flush the hub if the chain tip moved past `last_tip`.
///
/// After this returns, the caller has observed every notification for
/// blocks up to the tip it just read. With an unchanged tip there is
/// nothing new to wait for and the call returns immediately.
pub async fn sync_if_tip_changed(
    notifier: &ChainNotifier,
    chain: &dyn ChainView,
    last_tip: Option<Hash>,
) {
    let tip = chain.tip();
    let unchanged = matches!((last_tip, tip), (Some(last), Some(tip)) if last == tip.hash);
    if unchanged {
        return;
    }
    debug!(
        tip = %tip.map_or_else(|| "null".to_string(), |p| hex::encode(p.hash)),
        "tip moved; flushing notification queue"
    );
    notifier.flush().await;
}
