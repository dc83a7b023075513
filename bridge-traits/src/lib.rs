//! # Host Bridge Traits
//!
//! Contract between a host environment that owns storage and the native
//! compiler runtime that reads sources and writes outputs through it.
//!
//! ## Overview
//!
//! Two families of traits live here:
//!
//! - **Host handles** ([`InputFileSystem`](host::InputFileSystem),
//!   [`OutputFileSystem`](host::OutputFileSystem)): implemented by the host.
//!   Every I/O method follows the error-first callback convention and may
//!   complete inline or later from another thread.
//! - **Compiler-facing filesystems** ([`ReadableFileSystem`](fs::ReadableFileSystem),
//!   [`WritableFileSystem`](fs::WritableFileSystem)): async traits consumed by
//!   the compiler. `bridge-host` implements them over host handles,
//!   `bridge-desktop` implements them natively.
//!
//! ## Error Handling
//!
//! Host failures are represented by [`HostError`](host::HostError), which keeps
//! the host's error fields (`code`, `errno`, `syscall`, `path`) verbatim. They
//! travel inside [`BridgeError::Host`](error::BridgeError::Host) without being
//! rewritten so downstream diagnostics stay compatible.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; callbacks are `Send` so hosts may
//! complete them from any thread.

pub mod error;
pub mod fs;
pub mod host;
pub mod path;

pub use error::BridgeError;

pub use fs::{DirEntry, FileSystem, Metadata, ReadableFileSystem, WritableFileSystem};
pub use host::{
    FileContent, HostCallback, HostError, HostResult, HostStats, InputFileSystem,
    OutputFileSystem,
};
