//! Lazily bound, memoized operations.
//!
//! Every operation an adapter exposes is a [`BoundFn`] built on first access
//! by a pure builder and cached in a [`Memoized`] cell for the lifetime of
//! the adapter. Later accesses hand out the very same callable.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use bridge_traits::HostResult;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

type Operation<A, R> = dyn Fn(A) -> BoxFuture<'static, HostResult<R>> + Send + Sync;

/// A bound adapter operation: takes its argument, resolves once.
pub struct BoundFn<A, R> {
    inner: Arc<Operation<A, R>>,
}

impl<A, R> BoundFn<A, R>
where
    A: 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HostResult<R>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |arg| f(arg).boxed()),
        }
    }

    pub fn call(&self, arg: A) -> BoxFuture<'static, HostResult<R>> {
        (self.inner)(arg)
    }
}

impl<A, R> BoundFn<A, R> {
    /// Whether both handles refer to the same bound callable.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A, R> Clone for BoundFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for BoundFn<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFn").finish_non_exhaustive()
    }
}

/// Build-once, cache-forever cell.
pub struct Memoized<T> {
    name: &'static str,
    cell: OnceLock<T>,
    builder: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Memoized<T> {
    pub fn new(name: &'static str, builder: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
            builder: Box::new(builder),
        }
    }

    /// The cached value, running the builder on first access.
    pub fn get(&self) -> &T {
        self.cell.get_or_init(|| {
            debug!(operation = self.name, "Binding host operation");
            (self.builder)()
        })
    }

    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for Memoized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doubling() -> BoundFn<u32, u32> {
        BoundFn::new(|n: u32| async move { Ok(n * 2) })
    }

    #[test]
    fn test_builder_runs_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let memo = Memoized::new("double", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            doubling()
        });

        assert!(!memo.is_bound());
        let first = memo.get().clone();
        let second = memo.get().clone();

        assert!(memo.is_bound());
        assert!(first.ptr_eq(&second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_bindings_are_not_equal() {
        assert!(!doubling().ptr_eq(&doubling()));
    }

    #[tokio::test]
    async fn test_call_before_and_after_binding_agree() {
        let memo = Memoized::new("double", doubling);
        let direct = doubling().call(21).await.unwrap();
        let first = memo.get().call(21).await.unwrap();
        let again = memo.get().call(21).await.unwrap();

        assert_eq!(direct, 42);
        assert_eq!(first, again);
    }

    #[test]
    fn test_concurrent_first_access_binds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let memo = Arc::new(Memoized::new("double", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            doubling()
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = memo.clone();
                std::thread::spawn(move || memo.get().clone())
            })
            .collect();
        let bound: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(bound.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    }
}
