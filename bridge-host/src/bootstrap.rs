//! Convenience helpers for wiring the filesystem bridge of one compiler
//! context.
//!
//! Hosts call [`build_fs_bindings`] once per compiler (main or child) with
//! the handles they want to expose. The returned [`FsBindings`] owns the
//! threadsafe adapters for that context and hands out the compiler-facing
//! trait objects.

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, InputFileSystem, OutputFileSystem, ReadableFileSystem,
    WritableFileSystem,
};
use tracing::info;

use crate::{
    fs_adapter::{HostReadableFileSystem, HostWritableFileSystem},
    readable::ThreadsafeReadableFs,
    writable::{AdapterMode, ThreadsafeWritableFs},
};

/// Kind of compiler the bindings are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompilerContext {
    #[default]
    Main,
    /// Sub-compilation; usually has no output target of its own.
    Child,
}

/// Configuration for [`build_fs_bindings`].
#[derive(Clone, Default)]
pub struct FsBridgeConfig {
    /// Handle used to read sources. Required.
    pub input: Option<Arc<dyn InputFileSystem>>,
    /// Handle used to emit outputs. Writes are discarded when absent.
    pub output: Option<Arc<dyn OutputFileSystem>>,
    pub context: CompilerContext,
}

impl FsBridgeConfig {
    /// Config for a main compiler reading from `input` with no output yet.
    pub fn new(input: Arc<dyn InputFileSystem>) -> Self {
        Self {
            input: Some(input),
            ..Self::default()
        }
    }

    /// Config for a main compiler reading from `input` and writing to `output`.
    pub fn main(input: Arc<dyn InputFileSystem>, output: Arc<dyn OutputFileSystem>) -> Self {
        Self::new(input).with_output(output)
    }

    /// Config for a child compiler, which only reads.
    pub fn child(input: Arc<dyn InputFileSystem>) -> Self {
        Self::new(input).with_context(CompilerContext::Child)
    }

    pub fn with_input(mut self, input: Arc<dyn InputFileSystem>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: Arc<dyn OutputFileSystem>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_context(mut self, context: CompilerContext) -> Self {
        self.context = context;
        self
    }
}

impl fmt::Debug for FsBridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsBridgeConfig")
            .field("input", &self.input.as_ref().map(|_| "InputFileSystem { ... }"))
            .field(
                "output",
                &self.output.as_ref().map(|_| "OutputFileSystem { ... }"),
            )
            .field("context", &self.context)
            .finish()
    }
}

/// Filesystem adapters of one compiler context.
#[derive(Debug, Clone)]
pub struct FsBindings {
    pub input: Arc<ThreadsafeReadableFs>,
    pub output: Arc<ThreadsafeWritableFs>,
    pub context: CompilerContext,
}

impl FsBindings {
    /// Compiler-facing read access.
    pub fn readable(&self) -> Arc<dyn ReadableFileSystem> {
        Arc::new(HostReadableFileSystem::new(Arc::clone(&self.input)))
    }

    /// Compiler-facing write access.
    pub fn writable(&self) -> Arc<dyn WritableFileSystem> {
        Arc::new(HostWritableFileSystem::new(Arc::clone(&self.output)))
    }

    pub fn output_mode(&self) -> AdapterMode {
        self.output.mode()
    }
}

/// Build the read and write adapters for one compiler context.
///
/// # Errors
///
/// Returns [`BridgeError::Configuration`](bridge_traits::BridgeError::Configuration)
/// when no input handle is configured.
pub fn build_fs_bindings(config: FsBridgeConfig) -> BridgeResult<FsBindings> {
    let input = Arc::new(ThreadsafeReadableFs::new(config.input)?);
    let output = Arc::new(ThreadsafeWritableFs::new(config.output));

    info!(
        context = ?config.context,
        output = ?output.mode(),
        "Filesystem bindings ready"
    );

    Ok(FsBindings {
        input,
        output,
        context: config.context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSystem;
    use bridge_traits::BridgeError;

    #[test]
    fn test_missing_input_fails_fast() {
        let err = build_fs_bindings(FsBridgeConfig::default()).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_child_context_discards_writes() {
        let mem = Arc::new(MemoryFileSystem::new());
        let bindings = build_fs_bindings(FsBridgeConfig::child(mem)).unwrap();

        assert_eq!(bindings.context, CompilerContext::Child);
        assert_eq!(bindings.output_mode(), AdapterMode::NoOp);
    }

    #[test]
    fn test_main_context_is_live() {
        let mem = Arc::new(MemoryFileSystem::new());
        let bindings = build_fs_bindings(FsBridgeConfig::main(mem.clone(), mem)).unwrap();

        assert_eq!(bindings.context, CompilerContext::Main);
        assert_eq!(bindings.output_mode(), AdapterMode::Live);
    }

    #[test]
    fn test_debug_hides_handles() {
        let mem = Arc::new(MemoryFileSystem::new());
        let rendered = format!("{:?}", FsBridgeConfig::new(mem));
        assert!(rendered.contains("InputFileSystem { ... }"));
        assert!(rendered.contains("Main"));
        assert!(rendered.contains("output: None"));
    }
}
