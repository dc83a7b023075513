//! Threadsafe read adapter over a host [`InputFileSystem`].
//!
//! Reading is mandatory for a compiler context, so construction fails with
//! [`BridgeError::Configuration`] when no handle is supplied.
//!
//! `read_file`, `stat`, `lstat` and `realpath` translate one host call each.
//! `read_dir` lists the directory and then stats every entry concurrently,
//! joining the lookups into one all-or-nothing result.

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    error::{BridgeError, Result},
    DirEntry, FileContent, InputFileSystem, Metadata,
};
use tracing::{debug, trace};

use crate::callback::host_call;
use crate::join::FanOutJoin;
use crate::memoize::{BoundFn, Memoized};

pub struct ThreadsafeReadableFs {
    read_file: Memoized<BoundFn<String, FileContent>>,
    read_dir: Memoized<BoundFn<String, Vec<DirEntry>>>,
    stat: Memoized<BoundFn<String, Metadata>>,
    lstat: Memoized<BoundFn<String, Metadata>>,
    realpath: Memoized<BoundFn<String, String>>,
}

impl ThreadsafeReadableFs {
    /// Create the adapter over `fs`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] when `fs` is `None`.
    pub fn new(fs: Option<Arc<dyn InputFileSystem>>) -> Result<Self> {
        let fs = fs.ok_or_else(|| {
            BridgeError::Configuration(
                "ThreadsafeReadableFs requires an InputFileSystem".to_string(),
            )
        })?;
        debug!("Creating threadsafe readable filesystem");

        Ok(Self {
            read_file: Memoized::new("readFile", binder(&fs, bind_read_file)),
            read_dir: Memoized::new("readDir", binder(&fs, bind_read_dir)),
            stat: Memoized::new("stat", binder(&fs, bind_stat)),
            lstat: Memoized::new("lstat", binder(&fs, bind_lstat)),
            realpath: Memoized::new("realpath", binder(&fs, bind_realpath)),
        })
    }

    pub fn read_file(&self) -> &BoundFn<String, FileContent> {
        self.read_file.get()
    }

    pub fn read_dir(&self) -> &BoundFn<String, Vec<DirEntry>> {
        self.read_dir.get()
    }

    pub fn stat(&self) -> &BoundFn<String, Metadata> {
        self.stat.get()
    }

    pub fn lstat(&self) -> &BoundFn<String, Metadata> {
        self.lstat.get()
    }

    pub fn realpath(&self) -> &BoundFn<String, String> {
        self.realpath.get()
    }

    /// Names of the operations that have been bound so far.
    pub fn bound_operations(&self) -> Vec<&'static str> {
        [
            (self.read_file.name(), self.read_file.is_bound()),
            (self.read_dir.name(), self.read_dir.is_bound()),
            (self.stat.name(), self.stat.is_bound()),
            (self.lstat.name(), self.lstat.is_bound()),
            (self.realpath.name(), self.realpath.is_bound()),
        ]
        .into_iter()
        .filter_map(|(name, bound)| bound.then_some(name))
        .collect()
    }
}

impl fmt::Debug for ThreadsafeReadableFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadsafeReadableFs")
            .field("bound", &self.bound_operations())
            .finish()
    }
}

fn binder<T: 'static>(
    fs: &Arc<dyn InputFileSystem>,
    bind: fn(Arc<dyn InputFileSystem>) -> T,
) -> impl Fn() -> T + Send + Sync + 'static {
    let fs = Arc::clone(fs);
    move || bind(Arc::clone(&fs))
}

fn bind_read_file(fs: Arc<dyn InputFileSystem>) -> BoundFn<String, FileContent> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "readFile");
            host_call("open", |cb| fs.read_file(&path, cb)).await
        }
    })
}

fn bind_stat(fs: Arc<dyn InputFileSystem>) -> BoundFn<String, Metadata> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "stat");
            host_call("stat", |cb| fs.stat(&path, cb))
                .await
                .map(Metadata::from)
        }
    })
}

fn bind_lstat(fs: Arc<dyn InputFileSystem>) -> BoundFn<String, Metadata> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "lstat");
            host_call("lstat", |cb| fs.lstat(&path, cb))
                .await
                .map(Metadata::from)
        }
    })
}

fn bind_realpath(fs: Arc<dyn InputFileSystem>) -> BoundFn<String, String> {
    BoundFn::new(move |path: String| {
        let fs = Arc::clone(&fs);
        async move {
            trace!(path = %path, "realpath");
            host_call("realpath", |cb| fs.realpath(&path, cb)).await
        }
    })
}

fn bind_read_dir(fs: Arc<dyn InputFileSystem>) -> BoundFn<String, Vec<DirEntry>> {
    BoundFn::new(move |dir: String| {
        let fs = Arc::clone(&fs);
        async move {
            let names = host_call("scandir", |cb| fs.readdir(&dir, cb)).await?;
            if names.is_empty() {
                return Ok(Vec::new());
            }

            debug!(path = %dir, entries = names.len(), "Fanning out stat lookups");
            let (join, outcome) = FanOutJoin::new(names.len(), "stat");
            for name in names {
                let path = fs.join(&dir, &name);
                let join = Arc::clone(&join);
                let entry_path = path.clone();
                fs.stat(
                    &path,
                    Box::new(move |result| {
                        join.complete(result.map(|stats| DirEntry {
                            path: entry_path,
                            metadata: Metadata::from(&stats),
                        }));
                    }),
                );
            }
            // Only the callbacks may keep the join alive from here on.
            drop(join);

            outcome.wait().await
        }
    })
}
