//! # Subscriber Capability Trait
//!
//! The interface observers implement to receive validation events. Every
//! method has a default no-op body, so implementors override only the
//! events they care about and pick up new event kinds for free.
//!
//! Deferred events (`on_transaction_added` through
//! `on_chain_state_flushed`) arrive on the hub's queue worker, strictly
//! in notification order. Synchronous events (`on_block_checked`,
//! `on_new_pow_valid_block`) arrive inline on the validation engine's own
//! task and block it until they return, so keep those fast.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use chain_types::{
    Block, BlockLocator, BlockPosition, BlockValidationState, MempoolRemovalReason, Transaction,
};

/// Receiver of validation events.
///
/// Implementations must tolerate being unregistered while one of their
/// callbacks is executing: the in-flight callback always completes, and
/// nothing is delivered afterwards.
#[async_trait]
pub trait ChainSubscriber: Send + Sync {
    /// A transaction entered the mempool.
    async fn on_transaction_added(&self, _tx: Arc<Transaction>) {}

    /// A transaction left the mempool for the given reason.
    ///
    /// Not fired when the reason is inclusion in a block that stays
    /// connected; that case is covered by [`on_block_connected`].
    ///
    /// [`on_block_connected`]: ChainSubscriber::on_block_connected
    async fn on_transaction_removed(&self, _tx: Arc<Transaction>, _reason: MempoolRemovalReason) {}

    /// A block was connected to the active chain.
    async fn on_block_connected(&self, _block: Arc<Block>, _position: BlockPosition) {}

    /// A block was disconnected from the active chain (reorg).
    async fn on_block_disconnected(&self, _block: Arc<Block>, _position: BlockPosition) {}

    /// The chain tip moved. `fork_point` is the last common block when
    /// the update was a reorg, `None` on a plain extension.
    async fn on_chain_tip_updated(
        &self,
        _new_tip: BlockPosition,
        _fork_point: Option<BlockPosition>,
        _initial_download: bool,
    ) {
    }

    /// Chain state reached durable storage up to the given locator.
    /// Subscribers persist their own sync point no further than this.
    async fn on_chain_state_flushed(&self, _locator: BlockLocator) {}

    /// Synchronous: a block finished full validation with the given
    /// verdict. Runs inline in the validation path.
    async fn on_block_checked(&self, _block: &Block, _state: &BlockValidationState) {}

    /// Synchronous: a block's proof of work checked out before full
    /// validation. Used for low-latency relay. Runs inline in the
    /// validation path.
    async fn on_new_pow_valid_block(&self, _position: BlockPosition, _block: Arc<Block>) {}
}

/// Subscriber that ignores every event.
///
/// Useful as a placeholder registration and as a base for tests.
#[derive(Debug, Default)]
pub struct NoopSubscriber;

#[async_trait]
impl ChainSubscriber for NoopSubscriber {}

/// Subscriber that logs every event at debug level with structured
/// fields. The built-in observer for debugging and demos; register it
/// like any other subscriber.
#[derive(Debug, Default)]
pub struct TraceSubscriber;

#[async_trait]
impl ChainSubscriber for TraceSubscriber {
    async fn on_transaction_added(&self, tx: Arc<Transaction>) {
        debug!(
            txid = %hex::encode(tx.txid()),
            wtxid = %hex::encode(tx.wtxid()),
            "observed transaction added"
        );
    }

    async fn on_transaction_removed(&self, tx: Arc<Transaction>, reason: MempoolRemovalReason) {
        debug!(
            txid = %hex::encode(tx.txid()),
            %reason,
            "observed transaction removed"
        );
    }

    async fn on_block_connected(&self, _block: Arc<Block>, position: BlockPosition) {
        debug!(
            hash = %hex::encode(position.hash),
            height = position.height,
            "observed block connected"
        );
    }

    async fn on_block_disconnected(&self, _block: Arc<Block>, position: BlockPosition) {
        debug!(
            hash = %hex::encode(position.hash),
            height = position.height,
            "observed block disconnected"
        );
    }

    async fn on_chain_tip_updated(
        &self,
        new_tip: BlockPosition,
        fork_point: Option<BlockPosition>,
        initial_download: bool,
    ) {
        debug!(
            hash = %hex::encode(new_tip.hash),
            height = new_tip.height,
            reorg = fork_point.is_some(),
            initial_download,
            "observed chain tip update"
        );
    }

    async fn on_chain_state_flushed(&self, locator: BlockLocator) {
        debug!(
            tip = %locator.tip().map_or_else(|| "null".to_string(), hex::encode),
            "observed chain state flush"
        );
    }

    async fn on_block_checked(&self, block: &Block, state: &BlockValidationState) {
        debug!(
            hash = %hex::encode(block.hash()),
            %state,
            "observed block checked"
        );
    }

    async fn on_new_pow_valid_block(&self, position: BlockPosition, _block: Arc<Block>) {
        debug!(
            hash = %hex::encode(position.hash),
            height = position.height,
            "observed new proof-of-work valid block"
        );
    }
}

/// Recording subscriber for tests: appends one label per received event.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSubscriber {
    pub log: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn push(&self, label: String) {
        self.log.lock().push(label);
    }
}

#[cfg(test)]
#[async_trait]
impl ChainSubscriber for RecordingSubscriber {
    async fn on_transaction_added(&self, tx: Arc<Transaction>) {
        self.push(format!("tx_added:{}", tx.nonce));
    }

    async fn on_transaction_removed(&self, tx: Arc<Transaction>, reason: MempoolRemovalReason) {
        self.push(format!("tx_removed:{}:{reason}", tx.nonce));
    }

    async fn on_block_connected(&self, _block: Arc<Block>, position: BlockPosition) {
        self.push(format!("block_connected:{}", position.height));
    }

    async fn on_block_disconnected(&self, _block: Arc<Block>, position: BlockPosition) {
        self.push(format!("block_disconnected:{}", position.height));
    }

    async fn on_chain_tip_updated(
        &self,
        new_tip: BlockPosition,
        _fork_point: Option<BlockPosition>,
        _initial_download: bool,
    ) {
        self.push(format!("tip_updated:{}", new_tip.height));
    }

    async fn on_chain_state_flushed(&self, locator: BlockLocator) {
        self.push(format!("state_flushed:{}", locator.hashes.len()));
    }

    async fn on_block_checked(&self, block: &Block, state: &BlockValidationState) {
        self.push(format!("block_checked:{}:{state}", block.header.height));
    }

    async fn on_new_pow_valid_block(&self, position: BlockPosition, _block: Arc<Block>) {
        self.push(format!("pow_valid:{}", position.height));
    }
}
