//! # Node State Views
//!
//! Minimal read interfaces the attachment glue needs from the node. The
//! node side implements these over its real data structures; tests
//! implement them over plain collections.

use chain_types::{BlockPosition, Transaction};
use std::sync::Arc;

/// Read access to the mempool contents.
pub trait MempoolView: Send + Sync {
    /// Every transaction currently in the mempool.
    ///
    /// Must be called while the caller's consistency domain is stable:
    /// notifications enqueued after this call have to reflect only
    /// mempool changes made after the snapshot.
    fn snapshot(&self) -> Vec<Arc<Transaction>>;
}

/// Read access to the active chain tip.
pub trait ChainView: Send + Sync {
    /// The current tip, `None` before genesis.
    fn tip(&self) -> Option<BlockPosition>;
}
