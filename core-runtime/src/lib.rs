//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the filesystem bridge crates:
//! - Logging and tracing setup
//! - Runtime error type
//!
//! Bridge crates only emit `tracing` events; hosts and tools call
//! [`logging::init_logging`] once at startup to decide where they go.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
