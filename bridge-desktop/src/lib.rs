//! # Desktop Bridge Implementations
//!
//! Native filesystem implementations for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`TokioFileSystem`]: the compiler-facing
//!   [`ReadableFileSystem`](bridge_traits::ReadableFileSystem) /
//!   [`WritableFileSystem`](bridge_traits::WritableFileSystem) traits over
//!   `tokio::fs`, for running without a host.
//! - [`NodeStyleFileSystem`]: a host handle over `std::fs` implementing
//!   [`InputFileSystem`](bridge_traits::InputFileSystem) and
//!   [`OutputFileSystem`](bridge_traits::OutputFileSystem), so the threadsafe
//!   adapters can be driven against a real disk.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_desktop::NodeStyleFileSystem;
//! use bridge_host::{build_fs_bindings, FsBridgeConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let disk = Arc::new(NodeStyleFileSystem::new());
//!     let bindings = build_fs_bindings(FsBridgeConfig::main(disk.clone(), disk)).unwrap();
//!     let entries = bindings.input.read_dir().call("./src".into()).await.unwrap();
//! }
//! ```

mod filesystem;
mod node_style;

pub use filesystem::TokioFileSystem;
pub use node_style::NodeStyleFileSystem;
