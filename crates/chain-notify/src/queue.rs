//! # Serial Task Queue
//!
//! Single-consumer FIFO for deferred notification tasks. Producers
//! enqueue boxed futures from any task or thread and return immediately;
//! one spawned worker drains the queue strictly in enqueue order, one
//! task at a time.
//!
//! The `draining` flag is the single-consumer invariant: whichever
//! context flips it idle→draining keeps popping until the deque is
//! empty, so a task enqueued while a drain is in progress is executed by
//! that same drain rather than a second consumer.
//!
//! A panicking task is caught and logged, then the drain moves on;
//! observability work must never wedge the queue.

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::QUEUE_DEPTH_WARN;

/// A deferred unit of work accepted by the queue.
pub type QueueTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Returned when enqueueing after [`SerialTaskQueue::close`].
#[derive(Debug, Error)]
#[error("serial task queue is closed")]
pub struct QueueClosed;

tokio::task_local! {
    /// Set while the worker executes a queued task; lets callers detect
    /// that they are running on the queue itself.
    static ON_QUEUE_WORKER: ();
}

/// True when the current task is a queued task being drained.
pub(crate) fn on_queue_worker() -> bool {
    ON_QUEUE_WORKER.try_with(|()| ()).is_ok()
}

struct QueueState {
    /// Tasks waiting to run; front is next.
    pending: VecDeque<QueueTask>,
    /// Whether some context is currently executing tasks.
    draining: bool,
    /// Set once by `close`; enqueue is rejected afterwards.
    closed: bool,
}

/// Single-consumer FIFO queue for deferred notification tasks.
pub struct SerialTaskQueue {
    state: Mutex<QueueState>,
    /// Tasks enqueued but not yet finished (an executing task counts).
    unfinished: AtomicUsize,
    /// Worker wakeup; a missed notify is held as a permit.
    wake: Notify,
    /// Worker join handle, taken by `close`.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialTaskQueue {
    /// Create the queue and spawn its worker task.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let queue = Arc::new(Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                draining: false,
                closed: false,
            }),
            unfinished: AtomicUsize::new(0),
            wake: Notify::new(),
            worker: Mutex::new(None),
        });
        let handle = tokio::spawn(worker_loop(Arc::clone(&queue)));
        *queue.worker.lock() = Some(handle);
        queue
    }

    /// Append a task to the back of the queue.
    ///
    /// Never executes the task inline and never blocks beyond the
    /// internal mutex; the task runs on the worker after everything
    /// enqueued before it.
    pub fn enqueue<F>(&self, task: F) -> Result<(), QueueClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let depth = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(QueueClosed);
            }
            // Count before the worker can possibly pop the task.
            self.unfinished.fetch_add(1, Ordering::AcqRel);
            state.pending.push_back(Box::pin(task));
            state.pending.len()
        };
        if depth == QUEUE_DEPTH_WARN {
            warn!(
                depth,
                "notification queue depth hit warning threshold; subscribers are falling behind"
            );
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Number of tasks enqueued but not yet finished executing.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.unfinished.load(Ordering::Acquire)
    }

    /// Wait until every task enqueued before this call has completed.
    ///
    /// Implemented as a marker task through the queue itself, so FIFO
    /// order is the proof: when the marker runs, everything ahead of it
    /// has finished. Tasks enqueued after this call may still be pending
    /// when it returns. Returns immediately on a closed queue.
    pub async fn wait_for_empty(&self) {
        let (done, drained) = oneshot::channel();
        if self
            .enqueue(async move {
                let _ = done.send(());
            })
            .is_err()
        {
            return;
        }
        // The sender is only dropped unsent if the worker is torn down
        // mid-drain; nothing left to wait for in that case either.
        let _ = drained.await;
    }

    /// Stop accepting tasks, finish the ones already accepted, and join
    /// the worker.
    pub async fn close(&self) {
        self.state.lock().closed = true;
        self.wake.notify_one();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "queue worker terminated abnormally");
            }
        }
    }

    /// Run queued tasks until the deque is empty. Exactly one context
    /// drains at a time; returns immediately if a drain is already in
    /// progress.
    async fn drain(&self) {
        {
            let mut state = self.state.lock();
            if state.draining || state.pending.is_empty() {
                return;
            }
            state.draining = true;
        }
        loop {
            let task = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(task) => task,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            let result = AssertUnwindSafe(ON_QUEUE_WORKER.scope((), task))
                .catch_unwind()
                .await;
            if let Err(payload) = result {
                error!(
                    panic = panic_message(payload.as_ref()),
                    "queued notification task panicked; continuing with next task"
                );
            }
            self.unfinished.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

async fn worker_loop(queue: Arc<SerialTaskQueue>) {
    loop {
        queue.drain().await;
        {
            let state = queue.state.lock();
            if state.closed && state.pending.is_empty() {
                break;
            }
        }
        queue.wake.notified().await;
    }
    debug!("serial task queue worker stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
