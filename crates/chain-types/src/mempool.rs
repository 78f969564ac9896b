//! # Mempool Vocabulary
//!
//! Reasons a transaction leaves the mempool, carried by
//! transaction-removed notifications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a transaction was removed from the mempool.
///
/// Inclusion in a connected block is reported as [`Block`]; wallets treat
/// that case differently from true evictions: the transaction is not
/// gone, it is confirmed.
///
/// [`Block`]: MempoolRemovalReason::Block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MempoolRemovalReason {
    /// Expired after exceeding its mempool time limit.
    Expiry,
    /// Evicted when the mempool hit its size cap.
    SizeLimit,
    /// Removed during a chain reorganization.
    Reorg,
    /// Included in a connected block.
    Block,
    /// Conflicted with a transaction in a connected block.
    Conflict,
    /// Replaced by a higher-fee conflicting transaction.
    Replaced,
}

impl fmt::Display for MempoolRemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Expiry => "expiry",
            Self::SizeLimit => "sizelimit",
            Self::Reorg => "reorg",
            Self::Block => "block",
            Self::Conflict => "conflict",
            Self::Replaced => "replaced",
        };
        f.write_str(s)
    }
}
