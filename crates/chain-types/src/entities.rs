//! # Core Chain Entities
//!
//! Transactions, blocks, and the position/locator types carried by
//! notification payloads.
//!
//! Hashes are computed with SHA-256 by feeding fields in declaration
//! order; `Transaction` distinguishes the signature-exclusive [`txid`]
//! from the signature-inclusive [`wtxid`].
//!
//! [`txid`]: Transaction::txid
//! [`wtxid`]: Transaction::wtxid

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 64-byte signature.
pub type Signature = [u8; 64];

/// A 32-byte account identifier.
pub type Address = [u8; 32];

/// A raw transaction as relayed between nodes.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address.
    pub from: Address,
    /// Recipient's address (`None` for pure data carriers).
    pub to: Option<Address>,
    /// Transferred amount in base units.
    pub value: u64,
    /// Sender's nonce to prevent replay.
    pub nonce: u64,
    /// Arbitrary payload bytes.
    pub data: Vec<u8>,
    /// Sender's signature over the transaction.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Transaction {
    /// Transaction identity: hash of every field except the signature.
    ///
    /// Two transactions differing only in signature bytes share a txid,
    /// which is what mempool replacement tracking keys on.
    pub fn txid(&self) -> Hash {
        let mut hasher = Sha256::new();
        self.update_core(&mut hasher);
        hasher.finalize().into()
    }

    /// Witness-inclusive identity: the txid input plus the signature.
    pub fn wtxid(&self) -> Hash {
        let mut hasher = Sha256::new();
        self.update_core(&mut hasher);
        hasher.update(self.signature);
        hasher.finalize().into()
    }

    fn update_core(&self, hasher: &mut Sha256) {
        hasher.update(self.from);
        if let Some(to) = &self.to {
            hasher.update(to);
        }
        hasher.update(self.value.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(&self.data);
    }
}

/// The header of a block: metadata and root hashes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u16,
    /// Block height in the chain.
    pub height: u64,
    /// Hash of the parent block (creates the chain linkage).
    pub parent_hash: Hash,
    /// Merkle root of all transactions in the block.
    pub merkle_root: Hash,
    /// Unix timestamp when the block was produced.
    pub timestamp: u64,
}

impl BlockHeader {
    /// The block hash: SHA-256 over the header fields.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.parent_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }
}

/// A full block as delivered by connect/disconnect notifications.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// All transactions in this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block hash (the header hash).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

/// Where a block sits in the chain.
///
/// Notifications carry this alongside the full block so subscribers get
/// height and hash without re-deriving them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockPosition {
    /// The block hash.
    pub hash: Hash,
    /// The block height.
    pub height: u64,
}

impl BlockPosition {
    /// Position of a block given its header.
    pub fn of(header: &BlockHeader) -> Self {
        Self {
            hash: header.hash(),
            height: header.height,
        }
    }
}

/// Compact fingerprint of a chain view: block hashes sampled back from
/// the tip. Carried by chain-state-flushed notifications so subscribers
/// can persist their sync point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockLocator {
    /// Sampled block hashes, tip first.
    pub hashes: Vec<Hash>,
}

impl BlockLocator {
    /// A locator with no entries (pre-genesis chain state).
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// The tip hash this locator was taken at, if any.
    pub fn tip(&self) -> Option<&Hash> {
        self.hashes.first()
    }
}
