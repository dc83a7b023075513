//! Threadsafe write adapter over a host [`OutputFileSystem`].
//!
//! Without a handle (a child compiler has no disk target) the adapter is
//! built in [`AdapterMode::NoOp`]: every operation accepts its arguments,
//! touches nothing, and resolves successfully.

use std::fmt;
use std::future;
use std::sync::Arc;

use bridge_traits::OutputFileSystem;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::callback::host_call;
use crate::helpers;
use crate::memoize::{BoundFn, Memoized};

/// Which implementation backs a write adapter, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMode {
    Live,
    NoOp,
}

pub struct ThreadsafeWritableFs {
    mode: AdapterMode,
    write_file: Memoized<BoundFn<(String, Bytes), ()>>,
    remove_file: Memoized<BoundFn<String, ()>>,
    mkdir: Memoized<BoundFn<String, ()>>,
    mkdirp: Memoized<BoundFn<String, Option<String>>>,
    remove_dir_all: Memoized<BoundFn<String, Option<String>>>,
}

impl ThreadsafeWritableFs {
    /// Create a live adapter over `fs`, or a no-op adapter when `fs` is `None`.
    pub fn new(fs: Option<Arc<dyn OutputFileSystem>>) -> Self {
        match fs {
            Some(fs) => Self::live(fs),
            None => Self::noop(),
        }
    }

    fn live(fs: Arc<dyn OutputFileSystem>) -> Self {
        debug!("Creating threadsafe writable filesystem");
        Self {
            mode: AdapterMode::Live,
            write_file: Memoized::new("writeFile", binder(&fs, bind_write_file)),
            remove_file: Memoized::new("removeFile", binder(&fs, bind_remove_file)),
            mkdir: Memoized::new("mkdir", binder(&fs, bind_mkdir)),
            mkdirp: Memoized::new("mkdirp", binder(&fs, bind_mkdirp)),
            remove_dir_all: Memoized::new("removeDirAll", binder(&fs, bind_remove_dir_all)),
        }
    }

    /// Create an adapter that discards every write.
    pub fn noop() -> Self {
        debug!("No output filesystem supplied, writes are discarded");
        Self {
            mode: AdapterMode::NoOp,
            write_file: Memoized::new("writeFile", noop),
            remove_file: Memoized::new("removeFile", noop),
            mkdir: Memoized::new("mkdir", noop),
            mkdirp: Memoized::new("mkdirp", noop),
            remove_dir_all: Memoized::new("removeDirAll", noop),
        }
    }

    pub fn mode(&self) -> AdapterMode {
        self.mode
    }

    pub fn is_noop(&self) -> bool {
        self.mode == AdapterMode::NoOp
    }

    pub fn write_file(&self) -> &BoundFn<(String, Bytes), ()> {
        self.write_file.get()
    }

    pub fn remove_file(&self) -> &BoundFn<String, ()> {
        self.remove_file.get()
    }

    pub fn mkdir(&self) -> &BoundFn<String, ()> {
        self.mkdir.get()
    }

    /// Resolves to the first directory created, `None` if it already existed.
    pub fn mkdirp(&self) -> &BoundFn<String, Option<String>> {
        self.mkdirp.get()
    }

    /// Resolves to the removed path, `None` if nothing existed.
    pub fn remove_dir_all(&self) -> &BoundFn<String, Option<String>> {
        self.remove_dir_all.get()
    }

    /// Names of the operations that have been bound so far.
    pub fn bound_operations(&self) -> Vec<&'static str> {
        [
            (self.write_file.name(), self.write_file.is_bound()),
            (self.remove_file.name(), self.remove_file.is_bound()),
            (self.mkdir.name(), self.mkdir.is_bound()),
            (self.mkdirp.name(), self.mkdirp.is_bound()),
            (self.remove_dir_all.name(), self.remove_dir_all.is_bound()),
        ]
        .into_iter()
        .filter_map(|(name, bound)| bound.then_some(name))
        .collect()
    }
}

impl fmt::Debug for ThreadsafeWritableFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadsafeWritableFs")
            .field("mode", &self.mode)
            .field("bound", &self.bound_operations())
            .finish()
    }
}

fn binder<T: 'static>(
    fs: &Arc<dyn OutputFileSystem>,
    bind: fn(Arc<dyn OutputFileSystem>) -> T,
) -> impl Fn() -> T + Send + Sync + 'static {
    let fs = Arc::clone(fs);
    move || bind(Arc::clone(&fs))
}

fn noop<A, R>() -> BoundFn<A, R>
where
    A: 'static,
    R: Default + Send + 'static,
{
    BoundFn::new(|_: A| future::ready(Ok(R::default())))
}

fn bind_write_file(fs: Arc<dyn OutputFileSystem>) -> BoundFn<(String, Bytes), ()> {
    BoundFn::new(move |(path, content): (String, Bytes)| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, size = content.len(), "writeFile");
            host_call("open", |cb| fs.write_file(&path, content, cb)).await
        }
    })
}

fn bind_remove_file(fs: Arc<dyn OutputFileSystem>) -> BoundFn<String, ()> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "unlink");
            host_call("unlink", |cb| fs.unlink(&path, cb)).await
        }
    })
}

fn bind_mkdir(fs: Arc<dyn OutputFileSystem>) -> BoundFn<String, ()> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "mkdir");
            host_call("mkdir", |cb| fs.mkdir(&path, cb)).await
        }
    })
}

fn bind_mkdirp(fs: Arc<dyn OutputFileSystem>) -> BoundFn<String, Option<String>> {
    BoundFn::new(move |path: String| helpers::mkdirp(Arc::clone(&fs), path))
}

fn bind_remove_dir_all(fs: Arc<dyn OutputFileSystem>) -> BoundFn<String, Option<String>> {
    BoundFn::new(move |path: String| helpers::rmrf(Arc::clone(&fs), path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSystem;

    #[tokio::test]
    async fn test_noop_resolves_without_io() {
        let fs = ThreadsafeWritableFs::new(None);
        assert_eq!(fs.mode(), AdapterMode::NoOp);

        fs.write_file()
            .call(("/out.js".into(), Bytes::from_static(b"x")))
            .await
            .unwrap();
        fs.remove_file().call("/out.js".into()).await.unwrap();
        fs.mkdir().call("/dist".into()).await.unwrap();
        assert_eq!(fs.mkdirp().call("/dist/a/b".into()).await.unwrap(), None);
        assert_eq!(fs.remove_dir_all().call("/dist".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_live_mkdir_and_remove() {
        let mem = Arc::new(MemoryFileSystem::new());
        let fs = ThreadsafeWritableFs::new(Some(mem.clone()));
        assert!(!fs.is_noop());

        fs.mkdir().call("/dist".into()).await.unwrap();
        assert!(mem.is_dir("/dist"));

        fs.write_file()
            .call(("/dist/a.js".into(), Bytes::from_static(b"a")))
            .await
            .unwrap();
        fs.remove_file().call("/dist/a.js".into()).await.unwrap();
        assert!(!mem.exists("/dist/a.js"));
    }

    #[tokio::test]
    async fn test_live_mkdir_error_passes_through() {
        let mem = Arc::new(MemoryFileSystem::new());
        let fs = ThreadsafeWritableFs::new(Some(mem));

        let err = fs.mkdir().call("/a/b".into()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.syscall.as_deref(), Some("mkdir"));
        assert_eq!(err.path.as_deref(), Some("/a/b"));
    }
}
