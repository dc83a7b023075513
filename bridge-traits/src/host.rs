//! Host Filesystem Handles
//!
//! Capability traits implemented by the host environment that owns the real
//! (or emulated) storage. The surface follows the error-first callback
//! convention: every I/O method receives a [`HostCallback`] that the host
//! invokes exactly once, either inline before returning or later from any
//! thread.
//!
//! Handles are borrowed by the bridge through an `Arc`; the bridge never
//! opens, closes, or pools them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path;

/// Error reported by a host filesystem call.
///
/// Carries the host's own error fields so they can cross the bridge
/// unmodified and stay compatible with downstream diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct HostError {
    /// Node-style error code (`ENOENT`, `EEXIST`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human readable message as produced by the host
    pub message: String,
    /// OS error number, negative as node reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    /// Name of the failing system call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syscall: Option<String>,
    /// Path the failing call operated on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Code used when a host hands back a callback without ever invoking it.
pub const CALLBACK_DROPPED: &str = "ECALLBACKDROPPED";

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            errno: None,
            syscall: None,
            path: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_errno(mut self, errno: i32) -> Self {
        self.errno = Some(errno);
        self
    }

    pub fn with_syscall(mut self, syscall: impl Into<String>) -> Self {
        self.syscall = Some(syscall.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Build a node-style error: `"{code}: {description}, {syscall} '{path}'"`.
    pub fn coded(code: &str, description: &str, syscall: &str, path: &str) -> Self {
        Self::new(format!("{code}: {description}, {syscall} '{path}'"))
            .with_code(code)
            .with_syscall(syscall)
            .with_path(path)
    }

    /// Translate a native I/O error into the host representation.
    ///
    /// `errno` is stored negated, the way node reports it.
    pub fn from_io(err: &std::io::Error, syscall: &str, path: &str) -> Self {
        use std::io::ErrorKind;

        let (code, description) = match err.kind() {
            ErrorKind::NotFound => ("ENOENT", "no such file or directory"),
            ErrorKind::AlreadyExists => ("EEXIST", "file already exists"),
            ErrorKind::PermissionDenied => ("EACCES", "permission denied"),
            ErrorKind::NotADirectory => ("ENOTDIR", "not a directory"),
            ErrorKind::IsADirectory => ("EISDIR", "illegal operation on a directory"),
            ErrorKind::DirectoryNotEmpty => ("ENOTEMPTY", "directory not empty"),
            ErrorKind::InvalidInput => ("EINVAL", "invalid argument"),
            ErrorKind::Unsupported => ("ENOSYS", "function not implemented"),
            _ => ("EIO", "i/o error"),
        };

        let mut host = Self::coded(code, description, syscall, path);
        if code == "EIO" {
            host.message = format!("EIO: {err}, {syscall} '{path}'");
        }
        if let Some(errno) = err.raw_os_error() {
            host = host.with_errno(-errno.abs());
        }
        host
    }

    /// Error for optional host methods the handle does not provide.
    pub fn unsupported(syscall: &str, path: &str) -> Self {
        Self::coded("ENOSYS", "function not implemented", syscall, path)
    }

    /// Error for a host that released a callback without completing it.
    pub fn callback_dropped(syscall: &str) -> Self {
        Self::new(format!(
            "{CALLBACK_DROPPED}: host dropped the callback without completing it, {syscall}"
        ))
        .with_code(CALLBACK_DROPPED)
        .with_syscall(syscall)
    }

    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some("ENOENT")
    }

    pub fn is_already_exists(&self) -> bool {
        self.code.as_deref() == Some("EEXIST")
    }
}

/// Error-first completion callback handed to host handles.
pub type HostCallback<T> = Box<dyn FnOnce(HostResult<T>) + Send + 'static>;

/// File payload as returned by a host `readFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Bytes(Bytes),
}

impl FileContent {
    pub fn into_bytes(self) -> Bytes {
        match self {
            FileContent::Text(text) => Bytes::from(text),
            FileContent::Bytes(bytes) => bytes,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Bytes(bytes) => bytes.as_ref(),
        }
    }
}

impl From<String> for FileContent {
    fn from(value: String) -> Self {
        FileContent::Text(value)
    }
}

impl From<Bytes> for FileContent {
    fn from(value: Bytes) -> Self {
        FileContent::Bytes(value)
    }
}

/// Raw stat result produced by a host handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub is_directory: bool,
    pub is_file: bool,
    pub is_symbolic_link: bool,
    pub size: u64,
    pub mtime_ms: Option<u64>,
}

impl HostStats {
    pub fn file(size: u64) -> Self {
        Self {
            is_file: true,
            size,
            ..Self::default()
        }
    }

    pub fn directory() -> Self {
        Self {
            is_directory: true,
            ..Self::default()
        }
    }

    pub fn symlink() -> Self {
        Self {
            is_symbolic_link: true,
            ..Self::default()
        }
    }
}

/// Read capabilities of a host filesystem.
///
/// `lstat` and `realpath` are optional on hosts; the defaults fail with an
/// `ENOSYS` host error. `join` defaults to [`path::join`].
pub trait InputFileSystem: Send + Sync {
    fn read_file(&self, path: &str, callback: HostCallback<FileContent>);

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>);

    fn stat(&self, path: &str, callback: HostCallback<HostStats>);

    fn lstat(&self, path: &str, callback: HostCallback<HostStats>) {
        callback(Err(HostError::unsupported("lstat", path)));
    }

    fn realpath(&self, path: &str, callback: HostCallback<String>) {
        callback(Err(HostError::unsupported("realpath", path)));
    }

    fn join(&self, root: &str, name: &str) -> String {
        path::join(root, name)
    }
}

/// Write capabilities of a host filesystem.
///
/// `rmdir`, `readdir` and `stat` are needed by the recursive helpers behind
/// `mkdirp` and `removeDirAll`.
pub trait OutputFileSystem: Send + Sync {
    fn write_file(&self, path: &str, content: Bytes, callback: HostCallback<()>);

    fn unlink(&self, path: &str, callback: HostCallback<()>);

    fn mkdir(&self, path: &str, callback: HostCallback<()>);

    fn rmdir(&self, path: &str, callback: HostCallback<()>);

    fn readdir(&self, path: &str, callback: HostCallback<Vec<String>>);

    fn stat(&self, path: &str, callback: HostCallback<HostStats>);

    fn join(&self, root: &str, name: &str) -> String {
        path::join(root, name)
    }

    fn dirname(&self, path: &str) -> String {
        path::dirname(path)
    }
}
