//! Error-first callback translation.
//!
//! Host handles report completion through a [`HostCallback`]. [`host_call`]
//! hands the host a callback wired to a oneshot channel and returns a future
//! that resolves exactly once with whatever the host delivered, whether the
//! host completed inline, later from another thread, or never.

use std::future::Future;

use bridge_traits::{HostCallback, HostError, HostResult};
use futures::channel::oneshot;
use tracing::warn;

/// Invoke a host method and await its error-first result.
///
/// `invoke` runs immediately and receives the callback to pass to the host.
/// A callback dropped without being called resolves to
/// [`HostError::callback_dropped`].
pub fn host_call<T, F>(syscall: &'static str, invoke: F) -> impl Future<Output = HostResult<T>> + Send
where
    T: Send + 'static,
    F: FnOnce(HostCallback<T>),
{
    let (tx, rx) = oneshot::channel();
    invoke(Box::new(move |result| {
        // receiver gone means the caller stopped waiting
        let _ = tx.send(result);
    }));

    async move {
        match rx.await {
            Ok(result) => result,
            Err(_) => {
                warn!(syscall, "Host dropped a callback without completing it");
                Err(HostError::callback_dropped(syscall))
            }
        }
    }
}
