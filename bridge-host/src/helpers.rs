//! Recursive directory helpers built on host primitives.
//!
//! `mkdirp` and `rmrf` only use the primitive calls of an
//! [`OutputFileSystem`] (`mkdir`, `stat`, `readdir`, `rmdir`, `unlink`), so
//! they work with any host handle.

use std::sync::Arc;

use bridge_traits::{HostResult, OutputFileSystem};
use futures::future::{self, BoxFuture, FutureExt};
use tracing::trace;

use crate::callback::host_call;

pub use bridge_traits::path::{dirname, join};

/// Create `path` and any missing parents.
///
/// Resolves to the first directory actually created, or `None` when `path`
/// already existed.
pub fn mkdirp(
    fs: Arc<dyn OutputFileSystem>,
    path: String,
) -> BoxFuture<'static, HostResult<Option<String>>> {
    async move {
        let err = match host_call("mkdir", |cb| fs.mkdir(&path, cb)).await {
            Ok(()) => return Ok(Some(path)),
            Err(err) if err.is_already_exists() => return Ok(None),
            Err(err) if err.is_not_found() => err,
            Err(err) => return Err(err),
        };

        let parent = fs.dirname(&path);
        if parent == path {
            return Err(err);
        }
        trace!(path = %path, parent = %parent, "Creating missing parent");
        let created = mkdirp(Arc::clone(&fs), parent).await?;

        match host_call("mkdir", |cb| fs.mkdir(&path, cb)).await {
            Ok(()) => Ok(Some(created.unwrap_or(path))),
            Err(err) if err.is_already_exists() => Ok(created),
            Err(err) => Err(err),
        }
    }
    .boxed()
}

/// Remove `path` and everything below it.
///
/// Children are removed concurrently and the first failure aborts the call.
/// Resolves to the removed path, or `None` if nothing existed there.
pub fn rmrf(
    fs: Arc<dyn OutputFileSystem>,
    path: String,
) -> BoxFuture<'static, HostResult<Option<String>>> {
    async move {
        let stats = match host_call("stat", |cb| fs.stat(&path, cb)).await {
            Ok(stats) => stats,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };

        if stats.is_directory {
            let names = host_call("scandir", |cb| fs.readdir(&path, cb)).await?;
            let children = names
                .iter()
                .map(|name| rmrf(Arc::clone(&fs), fs.join(&path, name)));
            future::try_join_all(children).await?;
            host_call("rmdir", |cb| fs.rmdir(&path, cb)).await?;
        } else {
            host_call("unlink", |cb| fs.unlink(&path, cb)).await?;
        }

        Ok(Some(path))
    }
    .boxed()
}
