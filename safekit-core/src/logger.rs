//! Forwarding of diagnostics to a host-provided logger.
//!
//! Records go through the `log` facade and reach the [`Logger`] installed
//! with [`set_logger`] while logging is enabled.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

/// Trait representing a sink for diagnostic messages emitted by the store.
///
/// This trait should be implemented by the host application to receive log
/// messages. It is exported via `UniFFI` for use in foreign languages.
///
/// # Examples
///
/// Implementing the `Logger` trait:
///
/// ```rust
/// use safekit_core::logger::{Logger, LogLevel};
///
/// struct MyLogger;
///
/// impl Logger for MyLogger {
///     fn log(&self, level: LogLevel, tag: String, message: String) {
///         println!("[{:?}] {tag}: {message}", level);
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object SafeKitLogger : Logger {
///     override fun log(level: LogLevel, tag: String, message: String) {
///         Log.println(level.toAndroidPriority(), tag, message)
///     }
/// }
///
/// setLogger(SafeKitLogger) // Call this only once!!!
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    ///
    /// # Arguments
    ///
    /// * `level` - The severity level of the log message.
    /// * `tag` - The component that emitted the message (the `log` target).
    /// * `message` - The log message to be recorded.
    fn log(&self, level: LogLevel, tag: String, message: String);
}

/// Enumeration of possible log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Designates very low priority, often extremely detailed messages.
    Trace,
    /// Designates lower priority debugging information.
    Debug,
    /// Designates informational messages that highlight the progress of the application.
    Info,
    /// Designates potentially harmful situations.
    Warn,
    /// Designates error events that might still allow the application to continue running.
    Error,
}

/// A logger that forwards records from the `log` facade to the user-provided
/// `Logger` implementation.
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        LOGGING_ENABLED.load(Ordering::Relaxed)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let is_record_from_safekit = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("safekit"));

        let is_debug_or_trace_level =
            record.level() == log::Level::Debug || record.level() == log::Level::Trace;

        // Dependencies only get to report warnings and errors.
        if is_debug_or_trace_level && !is_record_from_safekit {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(
                log_level(record.level()),
                record.target().to_string(),
                format!("{}", record.args()),
            );
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// The user-provided sink that `ForeignLogger` forwards to.
static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Forwarding switch driven by `StoreConfig::enable_logging`.
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Sets the global logger.
///
/// It initializes the logging system and should be called before any logging
/// occurs. If a logger has already been set, this function prints a message
/// and keeps the first one.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        println!("Logger already set");
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

/// Turns forwarding to the installed logger on or off.
///
/// When disabled the logger is a no-op; records are dropped before they are
/// formatted.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logging_enabled(enabled: bool) {
    LOGGING_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Returns whether records are currently forwarded to the installed logger.
#[must_use]
pub fn logging_enabled() -> bool {
    LOGGING_ENABLED.load(Ordering::Relaxed)
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
