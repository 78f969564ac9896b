//! # Chain Notifier
//!
//! The hub between the validation engine and its observers. Deferred
//! events are captured as tasks on the [`SerialTaskQueue`] and fanned out
//! to subscribers in registration order by the queue worker; the two
//! synchronous events walk the registry inline in the caller's task and
//! bypass the queue entirely.
//!
//! Every deferred notify call is O(1) for the producer: it formats the
//! event description and pushes a task. Subscriber work happens later on
//! the worker, with no validation lock held.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use chain_types::{
    Block, BlockLocator, BlockPosition, BlockValidationState, MempoolRemovalReason, Transaction,
};

use crate::queue::{on_queue_worker, QueueClosed, SerialTaskQueue};
use crate::registry::SubscriberRegistry;
use crate::subscriber::ChainSubscriber;

/// Validation-event dispatcher.
///
/// Cheap to clone; clones share the same queue and registry, so any
/// handle may notify, register, or flush.
#[derive(Clone)]
pub struct ChainNotifier {
    registry: Arc<SubscriberRegistry>,
    queue: Arc<SerialTaskQueue>,
}

impl ChainNotifier {
    /// Create the hub and spawn its queue worker.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new()),
            queue: SerialTaskQueue::new(),
        }
    }

    /// Register a subscriber for all events notified after this call.
    ///
    /// # Panics
    ///
    /// Panics if that exact subscriber is already registered.
    pub fn register_subscriber(&self, subscriber: Arc<dyn ChainSubscriber>) {
        self.registry.register(subscriber);
    }

    /// Unregister a subscriber; idempotent. An in-flight callback of
    /// this subscriber completes, nothing is delivered afterwards.
    pub fn unregister_subscriber(&self, subscriber: &Arc<dyn ChainSubscriber>) {
        self.registry.unregister(subscriber);
    }

    /// Unregister every subscriber.
    pub fn unregister_all(&self) {
        self.registry.unregister_all();
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Deferred notifications not yet fully processed (an executing
    /// callback task counts).
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.queue.pending()
    }

    /// Deferred: a transaction entered the mempool.
    pub fn notify_transaction_added(&self, tx: Arc<Transaction>) {
        let registry = Arc::clone(&self.registry);
        self.enqueue_event(
            format!(
                "transaction_added txid={} wtxid={}",
                hex::encode(tx.txid()),
                hex::encode(tx.wtxid())
            ),
            async move {
                registry
                    .for_each_subscriber(|s| {
                        let tx = Arc::clone(&tx);
                        async move { s.on_transaction_added(tx).await }
                    })
                    .await;
            },
        );
    }

    /// Deferred: a transaction left the mempool.
    pub fn notify_transaction_removed(&self, tx: Arc<Transaction>, reason: MempoolRemovalReason) {
        let registry = Arc::clone(&self.registry);
        self.enqueue_event(
            format!(
                "transaction_removed txid={} reason={reason}",
                hex::encode(tx.txid())
            ),
            async move {
                registry
                    .for_each_subscriber(|s| {
                        let tx = Arc::clone(&tx);
                        async move { s.on_transaction_removed(tx, reason).await }
                    })
                    .await;
            },
        );
    }

    /// Deferred: a block was connected to the active chain.
    pub fn notify_block_connected(&self, block: Arc<Block>, position: BlockPosition) {
        let registry = Arc::clone(&self.registry);
        self.enqueue_event(
            format!(
                "block_connected hash={} height={}",
                hex::encode(position.hash),
                position.height
            ),
            async move {
                registry
                    .for_each_subscriber(|s| {
                        let block = Arc::clone(&block);
                        async move { s.on_block_connected(block, position).await }
                    })
                    .await;
            },
        );
    }

    /// Deferred: a block was disconnected from the active chain.
    pub fn notify_block_disconnected(&self, block: Arc<Block>, position: BlockPosition) {
        let registry = Arc::clone(&self.registry);
        self.enqueue_event(
            format!(
                "block_disconnected hash={} height={}",
                hex::encode(position.hash),
                position.height
            ),
            async move {
                registry
                    .for_each_subscriber(|s| {
                        let block = Arc::clone(&block);
                        async move { s.on_block_disconnected(block, position).await }
                    })
                    .await;
            },
        );
    }

    /// Deferred: the chain tip moved.
    pub fn notify_chain_tip_updated(
        &self,
        new_tip: BlockPosition,
        fork_point: Option<BlockPosition>,
        initial_download: bool,
    ) {
        let registry = Arc::clone(&self.registry);
        let fork_desc = fork_point.map_or_else(|| "none".to_string(), |p| hex::encode(p.hash));
        self.enqueue_event(
            format!(
                "chain_tip_updated hash={} height={} fork={fork_desc} initial_download={initial_download}",
                hex::encode(new_tip.hash),
                new_tip.height
            ),
            async move {
                registry
                    .for_each_subscriber(|s| async move {
                        s.on_chain_tip_updated(new_tip, fork_point, initial_download)
                            .await;
                    })
                    .await;
            },
        );
    }

    /// Deferred: chain state reached durable storage.
    pub fn notify_chain_state_flushed(&self, locator: BlockLocator) {
        let registry = Arc::clone(&self.registry);
        self.enqueue_event(
            format!(
                "chain_state_flushed tip={}",
                locator
                    .tip()
                    .map_or_else(|| "null".to_string(), hex::encode)
            ),
            async move {
                registry
                    .for_each_subscriber(|s| {
                        let locator = locator.clone();
                        async move { s.on_chain_state_flushed(locator).await }
                    })
                    .await;
            },
        );
    }

    /// Synchronous: a block finished full validation with a verdict.
    ///
    /// Delivered inline, bypassing the deferred queue: a backlog of
    /// deferred events does not delay it, and no ordering relative to
    /// those events is implied. Returns after every subscriber callback
    /// has run. Callback panics propagate to the caller.
    pub async fn notify_block_checked(&self, block: &Block, state: &BlockValidationState) {
        debug!(
            hash = %hex::encode(block.hash()),
            %state,
            "dispatching block_checked"
        );
        self.registry
            .for_each_subscriber(|s| async move { s.on_block_checked(block, state).await })
            .await;
    }

    /// Synchronous: a block's proof of work checked out before full
    /// validation. Same delivery rules as [`notify_block_checked`].
    ///
    /// [`notify_block_checked`]: ChainNotifier::notify_block_checked
    pub async fn notify_new_pow_valid_block(&self, position: BlockPosition, block: Arc<Block>) {
        debug!(
            hash = %hex::encode(position.hash),
            height = position.height,
            "dispatching new_pow_valid_block"
        );
        self.registry
            .for_each_subscriber(|s| {
                let block = Arc::clone(&block);
                async move { s.on_new_pow_valid_block(position, block).await }
            })
            .await;
    }

    /// Enqueue an arbitrary task behind all previously enqueued
    /// notifications and ahead of later ones. The escape hatch used to
    /// serialize registration against in-flight events.
    pub fn submit_deferred<F>(&self, task: F) -> Result<(), QueueClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.queue.enqueue(task)
    }

    /// Wait until every deferred notification enqueued before this call
    /// has been delivered.
    ///
    /// Called from inside a queued callback this would wait on itself;
    /// that misuse is detected and degrades to a logged no-op.
    pub async fn flush(&self) {
        if on_queue_worker() {
            warn!("flush called from inside a queued callback; skipping wait to avoid self-deadlock");
            return;
        }
        self.queue.wait_for_empty().await;
    }

    /// Drain outstanding notifications, stop the queue worker, and drop
    /// all subscribers.
    ///
    /// Producers must have stopped first: any deferred notify after this
    /// panics, and `submit_deferred` returns [`QueueClosed`].
    pub async fn shutdown(&self) {
        debug!(
            pending = self.pending_callbacks(),
            subscribers = self.subscriber_count(),
            "notification hub shutting down"
        );
        self.queue.close().await;
        self.registry.unregister_all();
    }

    /// Common deferred path: log at enqueue time, then enqueue a task
    /// that logs again when it actually dispatches.
    fn enqueue_event<F>(&self, desc: String, deliver: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(event = %desc, "enqueuing notification");
        let task_desc = desc.clone();
        let result = self.queue.enqueue(async move {
            debug!(event = %task_desc, "dispatching notification");
            deliver.await;
        });
        assert!(result.is_ok(), "chain notifier used after shutdown ({desc})");
    }
}

impl Default for ChainNotifier {
    fn default() -> Self {
        Self::new()
    }
}
