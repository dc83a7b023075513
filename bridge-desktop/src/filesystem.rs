//! Compiler-facing filesystem over Tokio

use std::path::Path;

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    DirEntry, Metadata, ReadableFileSystem, WritableFileSystem,
};
use futures::future::try_join_all;
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Implements the compiler-facing traits directly with `tokio::fs`, for
/// builds that run without a host environment. `read_dir` stats every entry
/// concurrently and fails as a whole if any lookup fails, like the host
/// bridge does.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

fn to_metadata(meta: &std::fs::Metadata) -> Metadata {
    Metadata {
        is_dir: meta.is_dir(),
        is_file: meta.is_file(),
        is_symlink: meta.file_type().is_symlink(),
    }
}

#[async_trait]
impl ReadableFileSystem for TokioFileSystem {
    async fn read(&self, file: &Path) -> Result<Vec<u8>> {
        let data = fs::read(file).await.map_err(Self::map_io_error)?;
        debug!(path = ?file, size = data.len(), "Read file");
        Ok(data)
    }

    async fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut paths = Vec::new();
        let mut read_dir = fs::read_dir(dir).await.map_err(Self::map_io_error)?;
        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            paths.push(entry.path());
        }

        let entries = try_join_all(paths.into_iter().map(|path| async move {
            let meta = fs::metadata(&path).await.map_err(Self::map_io_error)?;
            Ok::<_, BridgeError>(DirEntry {
                path: path.to_string_lossy().into_owned(),
                metadata: to_metadata(&meta),
            })
        }))
        .await?;

        debug!(path = ?dir, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn metadata(&self, file: &Path) -> Result<Metadata> {
        let meta = fs::metadata(file).await.map_err(Self::map_io_error)?;
        Ok(to_metadata(&meta))
    }

    async fn symlink_metadata(&self, file: &Path) -> Result<Metadata> {
        let meta = fs::symlink_metadata(file)
            .await
            .map_err(Self::map_io_error)?;
        Ok(to_metadata(&meta))
    }

    async fn canonicalize(&self, file: &Path) -> Result<String> {
        let real = fs::canonicalize(file).await.map_err(Self::map_io_error)?;
        Ok(real.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl WritableFileSystem for TokioFileSystem {
    async fn create_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir(dir).await.map_err(Self::map_io_error)?;
        debug!(path = ?dir, "Created directory");
        Ok(())
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await.map_err(Self::map_io_error)?;
        debug!(path = ?dir, "Created directory tree");
        Ok(())
    }

    async fn write(&self, file: &Path, data: &[u8]) -> Result<()> {
        fs::write(file, data).await.map_err(Self::map_io_error)?;
        debug!(path = ?file, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn remove_file(&self, file: &Path) -> Result<()> {
        fs::remove_file(file).await.map_err(Self::map_io_error)?;
        debug!(path = ?file, "Deleted file");
        Ok(())
    }

    async fn remove_dir_all(&self, dir: &Path) -> Result<()> {
        match fs::remove_dir_all(dir).await {
            Ok(()) => {
                debug!(path = ?dir, "Deleted directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }
}
