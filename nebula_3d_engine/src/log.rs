//! Internal logging system for the Nebula3D engine
//!
//! Provides a pluggable [`Logger`] trait with a coloured-console default
//! implementation. The renderer thread and the simulation thread both log
//! through the same global logger, which is therefore behind an `RwLock`.
//! ERROR entries carry `file:line` information.

use colored::{Color, Colorize};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Global logger (lazily initialised with [`DefaultLogger`])
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Logger trait for custom logging implementations
///
/// Implement this trait to redirect engine logs (file logging, in-game
/// console, test capture, etc.) and install it with [`set_logger`].
pub trait Logger: Send + Sync {
    /// Process a single log entry
    fn log(&self, entry: &LogEntry);
}

/// A single log message with its metadata
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "nebula::CollisionSystem")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for ERROR logs)
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` suffix, present on ERROR entries
    fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues, carry file:line details)
    Error,
}

impl LogSeverity {
    /// Fixed-width console tag
    pub fn tag(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    /// Console colour for this severity
    fn colour(self) -> Color {
        match self {
            LogSeverity::Trace => Color::BrightBlack,
            LogSeverity::Debug => Color::Cyan,
            LogSeverity::Info => Color::Green,
            LogSeverity::Warn => Color::Yellow,
            LogSeverity::Error => Color::Red,
        }
    }
}

/// Default logger writing coloured output to stdout
///
/// Format: `[timestamp] [SEVERITY] [source] message`, with a ` (file:line)`
/// suffix on ERROR entries.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();

        let mut tag = entry.severity.tag().color(entry.severity.colour());
        if entry.severity == LogSeverity::Error {
            tag = tag.bold();
        }

        let mut line = format!(
            "[{}] [{}] [{}] {}",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            tag,
            entry.source.bright_blue(),
            entry.message
        );

        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }

        println!("{}", line);
    }
}

/// Install a custom logger, replacing the current one
pub fn set_logger<L: Logger + 'static>(logger: L) {
    let lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
    if let Ok(mut guard) = lock.write() {
        *guard = Box::new(logger);
    }
}

/// Reset the logger to [`DefaultLogger`]
pub fn reset_logger() {
    set_logger(DefaultLogger);
}

/// Dispatch a log entry without source location (used by the macros)
pub fn log(severity: LogSeverity, source: &str, message: String) {
    let lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
    if let Ok(guard) = lock.read() {
        guard.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }
}

/// Dispatch a log entry with `file:line` information (used by `engine_error!`)
pub fn log_detailed(
    severity: LogSeverity,
    source: &str,
    message: String,
    file: &'static str,
    line: u32,
) {
    let lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
    if let Ok(guard) = lock.read() {
        guard.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose)
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
