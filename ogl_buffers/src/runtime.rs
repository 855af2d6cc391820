/// Runtime - process-wide entry point
///
/// Holds the only global state of the crate: the logger. Everything about
/// buffers flows through the `BufferContext` returned by `init()`, which
/// the caller owns and passes to each `Buffer`.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;
use crate::buffer_context::BufferContext;
use crate::driver::Driver;
use crate::error::Result;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Runtime facade
pub struct Runtime;

impl Runtime {
    /// Load `driver`, probe its capabilities and return the shared context.
    ///
    /// Same as [`BufferContext::initialize`]. Call it once a rendering
    /// context is current, before creating any buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ogl_buffers::ogl::{Runtime, CapabilityTier};
    /// use ogl_buffers::ogl::driver::{DriverVersion, SoftwareDriver};
    ///
    /// let ctx = Runtime::init(Arc::new(SoftwareDriver::new(DriverVersion::new(2, 1))))?;
    /// assert_eq!(ctx.tier(), CapabilityTier::BindFallback);
    /// # Ok::<(), ogl_buffers::ogl::Error>(())
    /// ```
    pub fn init(driver: Arc<dyn Driver>) -> Result<Arc<BufferContext>> {
        BufferContext::initialize(driver)
    }

    // ===== LOGGING API =====

    /// Replace the global logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ogl_buffers::ogl::Runtime;
    /// use ogl_buffers::ogl::log::{Logger, LogEntry};
    ///
    /// struct Silent;
    ///
    /// impl Logger for Silent {
    ///     fn log(&self, _entry: &LogEntry) {}
    /// }
    ///
    /// Runtime::set_logger(Silent);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = self::logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without file:line. Used by `ogl_trace!` .. `ogl_warn!`.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log with file:line. Used by `ogl_error!`.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        if let Ok(lock) = logger().read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
