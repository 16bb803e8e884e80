//! httprpc-logging - Tracing subscriber setup
//!
//! This crate provides:
//! - [`init_logging`] to install a formatted `tracing` subscriber
//! - [`ReloadHandle`] to change the log level at runtime
//! - [`build_subscriber`] for scoped subscribers writing anywhere

mod reload;
mod subscriber;

pub use httprpc_core::LogLevel;
pub use reload::{FilterHandle, ReloadHandle, convert_level_to_filter};
pub use subscriber::{build_subscriber, init_logging, init_logging_from_config};

use httprpc_core::ConfigError;
use thiserror::Error;

/// Errors raised while setting up logging
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("reload handle not initialized")]
    NotInitialized,

    #[error("failed to reload filter: {0}")]
    Reload(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, LoggingError, ReloadHandle, init_logging};
}
