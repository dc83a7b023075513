//! Workspace facade crate.
//!
//! Re-exports the bridge crates so a compiler host can depend on a single
//! package. The `desktop` feature (default) additionally exposes the native
//! `tokio`/`std::fs` implementations from `bridge-desktop`.

pub use bridge_host as host;
pub use bridge_traits as traits;
pub use core_runtime as runtime;

#[cfg(feature = "desktop")]
pub use bridge_desktop as desktop;

pub use bridge_host::{
    build_fs_bindings, FsBindings, FsBridgeConfig, ThreadsafeReadableFs, ThreadsafeWritableFs,
};
pub use bridge_traits::{BridgeError, DirEntry, HostError, Metadata};
