//! Host filesystem handle over `std::fs`.
//!
//! [`NodeStyleFileSystem`] speaks the host side of the bridge: every method
//! takes an error-first callback and reports failures as node-style
//! [`HostError`]s. Created inside a Tokio runtime, each call runs on the
//! blocking pool and the callback fires from that pool thread. Created
//! outside one, calls run inline and the callback fires before the method
//! returns.

use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use bridge_traits::{
    FileContent, HostCallback, HostError, HostResult, HostStats, InputFileSystem,
    OutputFileSystem,
};
use bytes::Bytes;
use tokio::runtime::Handle;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct NodeStyleFileSystem {
    runtime: Option<Handle>,
}

impl NodeStyleFileSystem {
    /// Defer calls to the current Tokio runtime's blocking pool, or run them
    /// inline when there is no runtime.
    pub fn new() -> Self {
        Self {
            runtime: Handle::try_current().ok(),
        }
    }

    /// Run every call inline on the calling thread.
    pub fn inline() -> Self {
        Self { runtime: None }
    }

    /// Defer calls to the blocking pool of `handle`.
    pub fn with_runtime(handle: Handle) -> Self {
        Self {
            runtime: Some(handle),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.runtime.is_some()
    }

    fn dispatch<T, F>(&self, syscall: &'static str, path: &str, op: F, callback: HostCallback<T>)
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> io::Result<T> + Send + 'static,
    {
        let path = path.to_string();
        let run = move || {
            trace!(syscall, path = %path, "Native host call");
            let result: HostResult<T> =
                op(Path::new(&path)).map_err(|err| HostError::from_io(&err, syscall, &path));
            callback(result);
        };

        match &self.runtime {
            Some(handle) => {
                handle.spawn_blocking(run);
            }
            None => run(),
        }
    }

    fn scandir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        self.dispatch("scandir", path, read_names, callback);
    }

    fn stat_path(&self, path: &str, callback: HostCallback<HostStats>) {
        self.dispatch(
            "stat",
            path,
            |p| fs::metadata(p).map(|meta| to_stats(&meta)),
            callback,
        );
    }
}

fn read_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

fn to_stats(meta: &fs::Metadata) -> HostStats {
    HostStats {
        is_directory: meta.is_dir(),
        is_file: meta.is_file(),
        is_symbolic_link: meta.file_type().is_symlink(),
        size: meta.len(),
        mtime_ms: meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64),
    }
}

impl InputFileSystem for NodeStyleFileSystem {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>) {
        self.dispatch(
            "open",
            path,
            |p| fs::read(p).map(|data| FileContent::Bytes(Bytes::from(data))),
            callback,
        );
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        self.scandir(path, callback);
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        self.stat_path(path, callback);
    }

    fn lstat(&self, path: &str, callback: HostCallback<HostStats>) {
        self.dispatch(
            "lstat",
            path,
            |p| fs::symlink_metadata(p).map(|meta| to_stats(&meta)),
            callback,
        );
    }

    fn realpath(&self, path: &str, callback: HostCallback<String>) {
        self.dispatch(
            "realpath",
            path,
            |p| fs::canonicalize(p).map(|real| real.to_string_lossy().into_owned()),
            callback,
        );
    }
}

impl OutputFileSystem for NodeStyleFileSystem {
    fn write_file(&self, path: &str, content: Bytes, callback: HostCallback<()>) {
        self.dispatch("open", path, move |p| fs::write(p, &content), callback);
    }

    fn unlink(&self, path: &str, callback: HostCallback<()>) {
        self.dispatch("unlink", path, |p| fs::remove_file(p), callback);
    }

    fn mkdir(&self, path: &str, callback: HostCallback<()>) {
        self.dispatch("mkdir", path, |p| fs::create_dir(p), callback);
    }

    fn rmdir(&self, path: &str, callback: HostCallback<()>) {
        self.dispatch("rmdir", path, |p| fs::remove_dir(p), callback);
    }

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>) {
        self.scandir(path, callback);
    }

    fn stat(&self, path: &str, callback: HostCallback<HostStats>) {
        self.stat_path(path, callback);
    }
}
