//! Walks a compiler context through the host filesystem bridge.
//!
//! Run with:
//! ```bash
//! cargo run -p bridge-host --example filesystem_demo
//!
//! # Show every host call
//! cargo run -p bridge-host --example filesystem_demo -- trace
//! ```

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bridge_host::{build_fs_bindings, FsBridgeConfig, MemoryFileSystem};
use bridge_traits::WritableFileSystem;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel, LoggingConfig};
use tracing::{info, info_span, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = match env::args().nth(1) {
        Some(arg) => arg.parse::<LogLevel>()?,
        None => LogLevel::Debug,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(level),
    )?;

    let host = Arc::new(MemoryFileSystem::from_files([
        ("/project/src/index.js", "import { add } from './math';\nconsole.log(add(1, 2));\n"),
        ("/project/src/math.js", "export const add = (a, b) => a + b;\n"),
        ("/project/package.json", "{\"name\":\"demo\"}"),
    ]));

    let main = build_fs_bindings(FsBridgeConfig::main(host.clone(), host.clone()))?;
    let child = build_fs_bindings(FsBridgeConfig::child(host.clone()))?;

    async {
        let entries = main
            .input
            .read_dir()
            .call("/project/src".to_string())
            .await
            .context("listing sources")?;

        let mut bundle = String::new();
        for entry in entries.iter().filter(|e| e.metadata.is_file) {
            let source = main.input.read_file().call(entry.path.clone()).await?;
            info!(file = %strip_path(&entry.path), size = source.as_bytes().len(), "Loaded module");
            bundle.push_str(&String::from_utf8_lossy(source.as_bytes()));
        }

        let writer = main.writable();
        writer.remove_dir_all(Path::new("/project/dist")).await?;
        writer.create_dir_all(Path::new("/project/dist/js")).await?;
        writer
            .write(Path::new("/project/dist/js/main.js"), bundle.as_bytes())
            .await?;

        anyhow::Ok(())
    }
    .instrument(info_span!("main_compiler"))
    .await?;

    async {
        child
            .writable()
            .write(Path::new("/project/dist/js/child.js"), b"ignored")
            .await?;
        info!(mode = ?child.output_mode(), "Child compiler output discarded");
        anyhow::Ok(())
    }
    .instrument(info_span!("child_compiler"))
    .await?;

    let emitted = host
        .contents("/project/dist/js/main.js")
        .context("bundle was not written")?;
    info!(
        bytes = emitted.len(),
        child_written = host.exists("/project/dist/js/child.js"),
        "Build finished"
    );

    Ok(())
}
