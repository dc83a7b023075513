//! Fan-out/join over callback-completed host calls.
//!
//! A [`FanOutJoin`] is created for `N` sub-operations that complete through
//! host callbacks, possibly on different threads. It collapses them into a
//! single outcome: all `N` values, or the first error. The outcome is
//! delivered exactly once; completions arriving after it are discarded.
//!
//! ```ignore
//! let (join, outcome) = FanOutJoin::new(names.len(), "stat");
//! for name in names {
//!     let join = Arc::clone(&join);
//!     fs.stat(&name, Box::new(move |result| join.complete(result)));
//! }
//! drop(join);
//! let all = outcome.wait().await?;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bridge_traits::{HostError, HostResult};
use futures::channel::oneshot;
use tracing::trace;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FanOutJoin<T> {
    remaining: AtomicUsize,
    settled: AtomicBool,
    values: Mutex<Vec<T>>,
    sender: Mutex<Option<oneshot::Sender<HostResult<Vec<T>>>>>,
}

/// Receiving half of a [`FanOutJoin`].
pub struct JoinOutcome<T> {
    syscall: &'static str,
    receiver: oneshot::Receiver<HostResult<Vec<T>>>,
}

impl<T: Send + 'static> FanOutJoin<T> {
    /// Create a join expecting `expected` completions.
    ///
    /// With `expected == 0` the outcome is already settled to an empty vector.
    pub fn new(expected: usize, syscall: &'static str) -> (Arc<Self>, JoinOutcome<T>) {
        let (tx, rx) = oneshot::channel();
        let join = Arc::new(Self {
            remaining: AtomicUsize::new(expected),
            settled: AtomicBool::new(false),
            values: Mutex::new(Vec::with_capacity(expected)),
            sender: Mutex::new(Some(tx)),
        });

        if expected == 0 {
            join.settle(Ok(Vec::new()));
        }

        (
            join,
            JoinOutcome {
                syscall,
                receiver: rx,
            },
        )
    }

    /// Record the outcome of one sub-operation. Call once per sub-operation.
    pub fn complete(&self, outcome: HostResult<T>) {
        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                if self.settle(Err(err)) {
                    lock(&self.values).clear();
                }
                return;
            }
        };

        if self.is_settled() {
            return;
        }

        lock(&self.values).push(value);

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let values = std::mem::take(&mut *lock(&self.values));
            self.settle(Ok(values));
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Deliver `outcome` unless the join already settled. Returns whether this
    /// call was the one that settled it.
    fn settle(&self, outcome: HostResult<Vec<T>>) -> bool {
        if self.settled.swap(true, Ordering::AcqRel) {
            trace!("Join already settled, discarding outcome");
            return false;
        }
        if let Some(sender) = lock(&self.sender).take() {
            let _ = sender.send(outcome);
        }
        true
    }
}

impl<T> JoinOutcome<T> {
    /// Wait for the aggregate outcome.
    ///
    /// If every handle to the join is dropped before it settles (a host
    /// released a callback unanswered), resolves to
    /// [`HostError::callback_dropped`].
    pub async fn wait(self) -> HostResult<Vec<T>> {
        let syscall = self.syscall;
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(HostError::callback_dropped(syscall)),
        }
    }
}
