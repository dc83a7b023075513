//! Filesystem Abstractions for the Compiler
//!
//! Async traits the native compiler runtime reads sources and writes outputs
//! through. They are implemented both by host-backed bridges (which forward to
//! a host handle) and by native implementations (`tokio::fs`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::host::HostStats;

/// File kind flags, reduced from a host stat result.
///
/// Serialized as `{isDir, isFile, isSymlink}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
}

impl From<&HostStats> for Metadata {
    fn from(stats: &HostStats) -> Self {
        Self {
            is_dir: stats.is_directory,
            is_file: stats.is_file,
            is_symlink: stats.is_symbolic_link,
        }
    }
}

impl From<HostStats> for Metadata {
    fn from(stats: HostStats) -> Self {
        Self::from(&stats)
    }
}

/// One entry of a directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Joined absolute path of the entry
    pub path: String,
    pub metadata: Metadata,
}

/// Read access used by the compiler to load sources.
#[async_trait]
pub trait ReadableFileSystem: Send + Sync + std::fmt::Debug {
    /// Read the entire contents of a file into a bytes vector.
    ///
    /// Error: fails if the path does not already exist.
    async fn read(&self, file: &Path) -> Result<Vec<u8>>;

    /// List a directory, with metadata for every entry.
    ///
    /// Either every entry is returned or the whole call fails.
    async fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;

    /// Metadata following symbolic links.
    async fn metadata(&self, file: &Path) -> Result<Metadata>;

    /// Metadata of the link itself, without following it.
    async fn symlink_metadata(&self, file: &Path) -> Result<Metadata>;

    async fn canonicalize(&self, file: &Path) -> Result<String>;

    async fn read_to_string(&self, file: &Path) -> Result<String> {
        let bytes = self.read(file).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Write access used by the compiler to emit outputs.
#[async_trait]
pub trait WritableFileSystem: Send + Sync {
    /// Creates a new, empty directory at the provided path.
    ///
    /// NOTE: fails if a parent of the given path doesn't exist. Use
    /// [`WritableFileSystem::create_dir_all`] to create missing parents too.
    async fn create_dir(&self, dir: &Path) -> Result<()>;

    /// Recursively create a directory and all of its missing parents.
    async fn create_dir_all(&self, dir: &Path) -> Result<()>;

    /// Write a slice as the entire contents of a file, creating or truncating it.
    async fn write(&self, file: &Path, data: &[u8]) -> Result<()>;

    async fn remove_file(&self, file: &Path) -> Result<()>;

    /// Removes a directory after removing all its contents. Use carefully.
    async fn remove_dir_all(&self, dir: &Path) -> Result<()>;
}

/// Readable and writable filesystem.
pub trait FileSystem: ReadableFileSystem + WritableFileSystem {}

impl<T: ReadableFileSystem + WritableFileSystem> FileSystem for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_shape() {
        let metadata = Metadata::from(HostStats::directory());
        let json = serde_json::to_string(&metadata).unwrap();

        assert_eq!(json, r#"{"isDir":true,"isFile":false,"isSymlink":false}"#);
    }

    #[test]
    fn test_dir_entry_from_json() {
        let entry: DirEntry = serde_json::from_str(
            r#"{"path":"/a.txt","metadata":{"isDir":false,"isFile":true,"isSymlink":false}}"#,
        )
        .unwrap();

        assert_eq!(entry.path, "/a.txt");
        assert!(entry.metadata.is_file);
        assert!(!entry.metadata.is_dir);
    }

    #[derive(Debug)]
    struct Fixed(&'static [u8]);

    #[async_trait]
    impl ReadableFileSystem for Fixed {
        async fn read(&self, _file: &Path) -> Result<Vec<u8>> {
            Ok(self.0.to_vec())
        }

        async fn read_dir(&self, _dir: &Path) -> Result<Vec<DirEntry>> {
            Ok(Vec::new())
        }

        async fn metadata(&self, _file: &Path) -> Result<Metadata> {
            Ok(Metadata::default())
        }

        async fn symlink_metadata(&self, _file: &Path) -> Result<Metadata> {
            Ok(Metadata::default())
        }

        async fn canonicalize(&self, file: &Path) -> Result<String> {
            Ok(file.to_string_lossy().into_owned())
        }
    }

    #[tokio::test]
    async fn test_read_to_string_is_lossy() {
        let fs = Fixed(b"ok\xff");
        let text = fs.read_to_string(Path::new("/x")).await.unwrap();
        assert_eq!(text, "ok\u{fffd}");
    }
}
