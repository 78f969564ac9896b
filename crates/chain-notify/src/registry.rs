//! # Subscriber Registry
//!
//! Registration-ordered set of subscribers that stays consistent while
//! notifications are mid-flight.
//!
//! Each entry carries a reference count: 1 for the registration itself
//! plus 1 per in-progress iteration currently visiting it. Unregistering
//! marks the entry inactive and drops the registration reference; the
//! entry is physically removed when the count reaches zero, which may be
//! deferred to the end of a callback that is already running. The lock
//! is never held while a callback runs, so callbacks may register and
//! unregister freely, including unregistering themselves.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::subscriber::ChainSubscriber;

/// Identity of a registered subscriber: the `Arc`'s data pointer.
fn subscriber_key(subscriber: &Arc<dyn ChainSubscriber>) -> usize {
    Arc::as_ptr(subscriber) as *const () as usize
}

struct Entry {
    subscriber: Arc<dyn ChainSubscriber>,
    /// 1 while registered, +1 per iteration visiting this entry.
    refs: usize,
    /// Cleared by unregister; inactive entries are never visited again.
    active: bool,
}

#[derive(Default)]
struct RegistryState {
    /// Entries keyed by registration sequence; key order is
    /// notification order.
    entries: BTreeMap<u64, Entry>,
    /// Subscriber identity -> sequence, for O(1) unregister.
    by_key: HashMap<usize, u64>,
    /// Next sequence to assign.
    next_seq: u64,
}

impl RegistryState {
    /// Drop one reference on `seq`, erasing the entry at zero.
    fn release(&mut self, seq: u64, deactivate: bool) {
        let Some(entry) = self.entries.get_mut(&seq) else {
            return;
        };
        if deactivate {
            entry.active = false;
        }
        debug_assert!(entry.refs > 0, "entry reference count underflow");
        entry.refs -= 1;
        if entry.refs == 0 {
            self.entries.remove(&seq);
        }
    }
}

/// Registration-ordered subscriber set.
#[derive(Default)]
pub struct SubscriberRegistry {
    state: Mutex<RegistryState>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber at the tail of the notification order.
    ///
    /// # Panics
    ///
    /// Panics if this exact `Arc` is already registered. Silently
    /// replacing a live registration would make delivery windows
    /// ambiguous, so double-register is treated as a programming error.
    pub fn register(&self, subscriber: Arc<dyn ChainSubscriber>) {
        let key = subscriber_key(&subscriber);
        let mut state = self.state.lock();
        assert!(
            !state.by_key.contains_key(&key),
            "subscriber registered twice"
        );
        let seq = state.next_seq;
        state.next_seq += 1;
        state.by_key.insert(key, seq);
        state.entries.insert(
            seq,
            Entry {
                subscriber,
                refs: 1,
                active: true,
            },
        );
        debug!(seq, total = state.by_key.len(), "subscriber registered");
    }

    /// Unregister a subscriber. Unknown or already-removed subscribers
    /// are ignored, so double unregister is safe.
    ///
    /// If one of this subscriber's callbacks is executing right now, that
    /// callback finishes; the entry is destroyed once the last in-flight
    /// iteration releases it. No later events are delivered either way.
    pub fn unregister(&self, subscriber: &Arc<dyn ChainSubscriber>) {
        let key = subscriber_key(subscriber);
        let mut state = self.state.lock();
        let Some(seq) = state.by_key.remove(&key) else {
            debug!("unregister of unknown subscriber ignored");
            return;
        };
        state.release(seq, true);
        debug!(seq, total = state.by_key.len(), "subscriber unregistered");
    }

    /// Unregister every subscriber (shutdown path).
    pub fn unregister_all(&self) {
        let mut state = self.state.lock();
        let seqs: Vec<u64> = state.by_key.drain().map(|(_, seq)| seq).collect();
        let count = seqs.len();
        for seq in seqs {
            state.release(seq, true);
        }
        debug!(count, "all subscribers unregistered");
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every registered subscriber in registration order.
    ///
    /// The lock is released while `visit` runs. Subscribers registered
    /// while the walk is in progress are visited by it (they sit past
    /// the cursor); subscribers unregistered before their turn are
    /// skipped. Concurrent walks are safe; reference counts nest.
    pub async fn for_each_subscriber<F, Fut>(&self, mut visit: F)
    where
        F: FnMut(Arc<dyn ChainSubscriber>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut cursor = 0u64;
        loop {
            let (seq, subscriber) = {
                let mut state = self.state.lock();
                let Some((&seq, entry)) = state
                    .entries
                    .range_mut(cursor..)
                    .find(|(_, entry)| entry.active)
                else {
                    break;
                };
                entry.refs += 1;
                (seq, Arc::clone(&entry.subscriber))
            };

            let guard = ReleaseGuard {
                registry: self,
                seq,
            };
            visit(subscriber).await;
            drop(guard);
            cursor = seq + 1;
        }
    }
}

/// Releases an iteration's reference on an entry, panics included: if a
/// callback unwinds, the reference must not leak or the entry would
/// never be physically removed.
struct ReleaseGuard<'a> {
    registry: &'a SubscriberRegistry,
    seq: u64,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.registry.state.lock().release(self.seq, false);
    }
}
