//! # Chain Types Crate
//!
//! Domain entities shared between the validation engine, the notification
//! hub, and its subscribers (wallets, indexers, mempool trackers).
//!
//! ## Clusters
//!
//! - **Chain**: `Transaction`, `BlockHeader`, `Block`, `BlockPosition`,
//!   `BlockLocator`
//! - **Mempool**: `MempoolRemovalReason`
//! - **Validation**: `BlockValidationState`
//!
//! Everything here is plain data: cheap to clone, serde-serializable, and
//! free of any notification-hub machinery, so subscriber crates can depend
//! on this crate without pulling in the hub.

pub mod entities;
pub mod mempool;
pub mod validation;

pub use entities::*;
pub use mempool::MempoolRemovalReason;
pub use validation::BlockValidationState;
