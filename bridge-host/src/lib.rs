//! Host Filesystem Bridge
//!
//! Lets a native, multi-threaded compiler read sources from and write
//! outputs to a filesystem owned by a host environment. The host exposes
//! callback-style handles ([`InputFileSystem`](bridge_traits::InputFileSystem),
//! [`OutputFileSystem`](bridge_traits::OutputFileSystem)); this crate wraps
//! them in threadsafe adapters whose operations are awaitable from any
//! worker thread.
//!
//! # Components
//!
//! - [`ThreadsafeReadableFs`]: `read_file`, `read_dir`, `stat`, `lstat`,
//!   `realpath`. Requires an input handle.
//! - [`ThreadsafeWritableFs`]: `write_file`, `remove_file`, `mkdir`, `mkdirp`,
//!   `remove_dir_all`. Becomes a no-op adapter when no output handle exists.
//! - [`Memoized`] / [`BoundFn`]: each operation is bound on first use and
//!   reused for the adapter's lifetime.
//! - [`FanOutJoin`]: collects N concurrent callback results into one
//!   all-or-nothing outcome.
//! - [`HostReadableFileSystem`] / [`HostWritableFileSystem`]: compiler-facing
//!   async traits backed by the adapters.
//! - [`MemoryFileSystem`]: in-memory host handle for tests and tooling.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use bridge_host::{build_fs_bindings, FsBridgeConfig, MemoryFileSystem};
//!
//! # async fn demo() -> bridge_traits::error::Result<()> {
//! let host = Arc::new(MemoryFileSystem::from_files([("/src/index.js", "export {}")]));
//! let bindings = build_fs_bindings(FsBridgeConfig::main(host.clone(), host))?;
//!
//! let entries = bindings.input.read_dir().call("/src".to_string()).await?;
//! assert_eq!(entries.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod callback;
pub mod fs_adapter;
pub mod helpers;
pub mod join;
pub mod memoize;
pub mod memory;
pub mod readable;
pub mod writable;

pub use bootstrap::{build_fs_bindings, CompilerContext, FsBindings, FsBridgeConfig};
pub use callback::host_call;
pub use fs_adapter::{HostReadableFileSystem, HostWritableFileSystem};
pub use join::{FanOutJoin, JoinOutcome};
pub use memoize::{BoundFn, Memoized};
pub use memory::MemoryFileSystem;
pub use readable::ThreadsafeReadableFs;
pub use writable::{AdapterMode, ThreadsafeWritableFs};
