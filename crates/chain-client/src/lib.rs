//! # Chain Client - Subscriber Attachment Glue
//!
//! The client side of the notification hub: what a wallet, indexer, or
//! other observer uses to hook itself up to a running node.
//!
//! - [`attach_notifications`] registers a subscriber with a consistent
//!   mempool snapshot: no gap, no duplicate between snapshot and live
//!   events.
//! - [`NotificationHandle`] unregisters on drop.
//! - [`sync_if_tip_changed`] flushes the hub when the tip moved, so a
//!   caller that just read the tip has also seen its notifications.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod attach;
pub mod handle;
pub mod views;

// Re-export main types
pub use attach::{attach_notifications, sync_if_tip_changed, AttachError};
pub use handle::NotificationHandle;
pub use views::{ChainView, MempoolView};
