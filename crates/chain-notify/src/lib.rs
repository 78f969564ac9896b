//! # Chain Notify - Validation Event Hub
//!
//! Fans validation events out from the engine that produces them to the
//! components that observe them, without the engine knowing who listens.
//!
//! ## Event flow
//!
//! ```text
//! ┌────────────────┐  notify_*()   ┌───────────────┐   enqueue    ┌─────────────────┐
//! │ validation     │ ────────────▶ │ ChainNotifier │ ───────────▶ │ SerialTaskQueue │
//! │ engine         │               │               │              │ (FIFO worker)   │
//! └────────────────┘               └───────────────┘              └─────────────────┘
//!                                          │                               │
//!                                          │ sync events                   │ deferred events
//!                                          ▼                               ▼
//!                                  ┌────────────────────────────────────────────┐
//!                                  │ SubscriberRegistry (registration order)    │
//!                                  │   wallet · indexer · mempool tracker · ... │
//!                                  └────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Deferred events are delivered in notification order, by a single
//!   consumer, to every subscriber registered at delivery time.
//! - `notify_block_checked` / `notify_new_pow_valid_block` run inline in
//!   the caller and never wait behind the deferred backlog.
//! - Registration churn is safe while callbacks are mid-flight; an
//!   in-flight callback of an unregistered subscriber completes, and
//!   nothing is delivered to it afterwards.
//! - `flush().await` proves every previously enqueued notification has
//!   been processed.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod dispatcher;
pub mod queue;
pub mod registry;
pub mod subscriber;

// Re-export main types
pub use dispatcher::ChainNotifier;
pub use queue::{QueueClosed, SerialTaskQueue};
pub use registry::SubscriberRegistry;
pub use subscriber::{ChainSubscriber, NoopSubscriber, TraceSubscriber};

/// Pending-queue depth at which a warning is logged: subscribers are not
/// keeping up and memory is the only backpressure.
pub const QUEUE_DEPTH_WARN: usize = 10_000;
