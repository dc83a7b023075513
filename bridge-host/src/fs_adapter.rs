//! Compiler-facing filesystems backed by the threadsafe adapters.
//!
//! The compiler talks to [`ReadableFileSystem`] / [`WritableFileSystem`].
//! These adapters forward every call to the bound host operation and wrap
//! host failures in [`BridgeError::Host`](bridge_traits::BridgeError::Host)
//! without rewriting them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    error::Result, DirEntry, Metadata, ReadableFileSystem, WritableFileSystem,
};
use bytes::Bytes;

use crate::readable::ThreadsafeReadableFs;
use crate::writable::ThreadsafeWritableFs;

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub struct HostReadableFileSystem(Arc<ThreadsafeReadableFs>);

impl HostReadableFileSystem {
    pub fn new(fs: Arc<ThreadsafeReadableFs>) -> Self {
        Self(fs)
    }
}

impl fmt::Debug for HostReadableFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostReadableFileSystem").finish()
    }
}

#[async_trait]
impl ReadableFileSystem for HostReadableFileSystem {
    async fn read(&self, file: &Path) -> Result<Vec<u8>> {
        let content = self.0.read_file().call(path_string(file)).await?;
        Ok(content.into_bytes().to_vec())
    }

    async fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        Ok(self.0.read_dir().call(path_string(dir)).await?)
    }

    async fn metadata(&self, file: &Path) -> Result<Metadata> {
        Ok(self.0.stat().call(path_string(file)).await?)
    }

    async fn symlink_metadata(&self, file: &Path) -> Result<Metadata> {
        Ok(self.0.lstat().call(path_string(file)).await?)
    }

    async fn canonicalize(&self, file: &Path) -> Result<String> {
        Ok(self.0.realpath().call(path_string(file)).await?)
    }
}

pub struct HostWritableFileSystem(Arc<ThreadsafeWritableFs>);

impl HostWritableFileSystem {
    pub fn new(fs: Arc<ThreadsafeWritableFs>) -> Self {
        Self(fs)
    }
}

impl fmt::Debug for HostWritableFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostWritableFileSystem")
            .field("mode", &self.0.mode())
            .finish()
    }
}

#[async_trait]
impl WritableFileSystem for HostWritableFileSystem {
    async fn create_dir(&self, dir: &Path) -> Result<()> {
        Ok(self.0.mkdir().call(path_string(dir)).await?)
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        self.0.mkdirp().call(path_string(dir)).await?;
        Ok(())
    }

    async fn write(&self, file: &Path, data: &[u8]) -> Result<()> {
        let content = Bytes::copy_from_slice(data);
        Ok(self.0.write_file().call((path_string(file), content)).await?)
    }

    async fn remove_file(&self, file: &Path) -> Result<()> {
        Ok(self.0.remove_file().call(path_string(file)).await?)
    }

    async fn remove_dir_all(&self, dir: &Path) -> Result<()> {
        self.0.remove_dir_all().call(path_string(dir)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSystem;
    use bridge_traits::BridgeError;

    fn pair() -> (Arc<MemoryFileSystem>, HostReadableFileSystem, HostWritableFileSystem) {
        let mem = Arc::new(MemoryFileSystem::from_files([("/src/index.js", "export {}")]));
        let input = ThreadsafeReadableFs::new(Some(mem.clone())).unwrap();
        let output = ThreadsafeWritableFs::new(Some(mem.clone()));
        (
            mem,
            HostReadableFileSystem::new(Arc::new(input)),
            HostWritableFileSystem::new(Arc::new(output)),
        )
    }

    #[tokio::test]
    async fn test_read_to_string_through_host() {
        let (_, input, _) = pair();
        let text = input
            .read_to_string(Path::new("/src/index.js"))
            .await
            .unwrap();
        assert_eq!(text, "export {}");
    }

    #[tokio::test]
    async fn test_host_error_is_wrapped_verbatim() {
        let (_, input, _) = pair();
        let err = input.read(Path::new("/src/missing.js")).await.unwrap_err();

        match err {
            BridgeError::Host(host) => {
                assert_eq!(host.code.as_deref(), Some("ENOENT"));
                assert_eq!(host.path.as_deref(), Some("/src/missing.js"));
                assert_eq!(
                    host.message,
                    "ENOENT: no such file or directory, open '/src/missing.js'"
                );
            }
            other => panic!("expected host error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emit_and_clean_output_dir() {
        let (mem, _, output) = pair();
        output.create_dir_all(Path::new("/dist/js")).await.unwrap();
        output
            .write(Path::new("/dist/js/main.js"), b"console.log(1);")
            .await
            .unwrap();
        assert_eq!(
            mem.contents("/dist/js/main.js"),
            Some(Bytes::from_static(b"console.log(1);"))
        );

        output.remove_dir_all(Path::new("/dist")).await.unwrap();
        assert!(!mem.exists("/dist"));
    }
}
