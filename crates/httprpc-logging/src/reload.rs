//! Dynamic log level reloading support

use crate::LoggingError;
use httprpc_core::LogLevel;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{Registry, reload};

/// Handle of the level filter installed by [`crate::init_logging`]
pub type FilterHandle = reload::Handle<LevelFilter, Registry>;

struct Installed {
    handle: FilterHandle,
    level: LogLevel,
}

/// Handle for dynamically reloading the log level filter
pub struct ReloadHandle {
    installed: Mutex<Option<Installed>>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        Self {
            installed: Mutex::new(None),
        }
    }

    /// Get the global reload handle
    pub fn global() -> &'static ReloadHandle {
        static INSTANCE: OnceCell<ReloadHandle> = OnceCell::new();
        INSTANCE.get_or_init(ReloadHandle::new)
    }

    /// Set the filter handle (called during initialization)
    pub fn set_handle(&self, handle: FilterHandle, level: LogLevel) {
        *self.installed.lock() = Some(Installed { handle, level });
    }

    /// Whether a filter handle has been installed
    pub fn is_initialized(&self) -> bool {
        self.installed.lock().is_some()
    }

    /// Level currently applied, if initialized
    pub fn current_level(&self) -> Option<LogLevel> {
        self.installed.lock().as_ref().map(|installed| installed.level)
    }

    /// Reload the filter to use a new log level
    pub fn reload_level(&self, level: LogLevel) -> Result<(), LoggingError> {
        let mut guard = self.installed.lock();
        let installed = guard.as_mut().ok_or(LoggingError::NotInitialized)?;
        installed
            .handle
            .reload(convert_level_to_filter(level))
            .map_err(|e| LoggingError::Reload(e.to_string()))?;
        installed.level = level;
        tracing::info!(%level, "log level changed");
        Ok(())
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert LogLevel to tracing LevelFilter
pub fn convert_level_to_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}
