//! Subscriber construction and global installation

use crate::LoggingError;
use crate::reload::{FilterHandle, ReloadHandle, convert_level_to_filter};
use httprpc_core::{LogLevel, ServerConfig};
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

/// Build a subscriber that formats events to `writer`
///
/// Events below `level` are dropped by a reloadable filter; the returned
/// handle changes it.
pub fn build_subscriber<W>(level: LogLevel, writer: W) -> (impl Subscriber + Send + Sync, FilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(convert_level_to_filter(level));
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer),
    );
    (subscriber, handle)
}

/// Initialize logging to stderr at `level`
///
/// Call this once at startup. The level can be changed later through
/// [`ReloadHandle::global`].
pub fn init_logging(level: LogLevel) -> Result<(), LoggingError> {
    let (subscriber, handle) = build_subscriber(level, std::io::stderr);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    ReloadHandle::global().set_handle(handle, level);
    Ok(())
}

/// Initialize logging at the level named in the server configuration
pub fn init_logging_from_config(config: &ServerConfig) -> Result<(), LoggingError> {
    init_logging(config.log_level()?)
}
