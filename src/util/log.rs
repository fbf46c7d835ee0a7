// src/util/log.rs

//! Logger Utility - Provides file-based logging for TUI applications
//!
//! The terminal belongs to ratatui, so nothing is printed. Lines go to one
//! file per severity under `./logs` (or `SUPPORT_LOG_DIR`).
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::{LazyLock, OnceLock};
use chrono::Local;

pub const LOG_DIR_ENV: &str = "SUPPORT_LOG_DIR";

pub static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Global logger instance
pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| {
    Logger::new(&log_dir()).unwrap_or_else(|_| Logger::disabled())
});

pub fn log_dir() -> PathBuf {
    std::env::var(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./logs"))
}

/// Log severity levels
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_str(&self) -> &str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn filename(&self) -> &str {
        match self {
            LogLevel::Error => "error.log",
            LogLevel::Warn => "warn.log",
            LogLevel::Info => "info.log",
            LogLevel::Debug => "debug.log",
        }
    }
}

struct LogFiles {
    error: Mutex<File>,
    warn: Mutex<File>,
    info: Mutex<File>,
    debug: Mutex<File>,
}

/// Logger that writes to separate files by severity
pub struct Logger {
    files: Option<LogFiles>,
}

impl Logger {
    /// Create a new logger with the specified directory
    pub fn new(log_dir: &Path) -> std::io::Result<Self> {
        DEBUG_ENABLED.get_or_init(|| {
            std::env::var("DEBUG").unwrap_or_default() == "true"
        });

        create_dir_all(log_dir)?;

        // Start fresh each run
        let open = |level: LogLevel| File::create(log_dir.join(level.filename())).map(Mutex::new);
        let files = LogFiles {
            error: open(LogLevel::Error)?,
            warn: open(LogLevel::Warn)?,
            info: open(LogLevel::Info)?,
            debug: open(LogLevel::Debug)?,
        };

        Ok(Self { files: Some(files) })
    }

    /// A logger that drops every line (log directory not writable).
    pub fn disabled() -> Self {
        Self { files: None }
    }

    /// Write a log entry to the appropriate file
    fn write_log(&self, level: LogLevel, message: &str) {
        let Some(files) = &self.files else { return };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let formatted = format!("[{}] [{}] {}\n", timestamp, level.as_str(), message);

        let file = match level {
            LogLevel::Error => &files.error,
            LogLevel::Warn => &files.warn,
            LogLevel::Info => &files.info,
            LogLevel::Debug => &files.debug,
        };

        if let Ok(mut file) = file.lock() {
            let _ = file.write_all(formatted.as_bytes());
            let _ = file.flush();
        }
    }

    /// Log an error message
    pub fn error(&self, message: &str) {
        self.write_log(LogLevel::Error, message);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str) {
        self.write_log(LogLevel::Warn, message);
    }

    /// Log an info message
    pub fn info(&self, message: &str) {
        self.write_log(LogLevel::Info, message);
    }

    /// Log a debug message
    pub fn debug(&self, message: &str) {
        self.write_log(LogLevel::Debug, message);
    }
}

/// Convenience macro for error logging with formatting
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::util::log::LOGGER.error(&message);
    }};
}

/// Convenience macro for warning logging with formatting
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::util::log::LOGGER.warn(&message);
    }};
}

/// Convenience macro for info logging with formatting
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::util::log::LOGGER.info(&message);
    }};
}

/// Convenience macro for debug logging with formatting
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        if *$crate::util::log::DEBUG_ENABLED.get().unwrap_or(&false) {
            let message = format!($($arg)*);
            $crate::util::log::LOGGER.debug(&message);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_logger_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let logger = Logger::new(temp_dir.path()).expect("Failed to create logger");

        logger.error("Test error");
        logger.warn("Test warning");
        logger.info("Test info");
        logger.debug("Test debug");

        // Check that files were created
        for name in ["error.log", "warn.log", "info.log", "debug.log"] {
            assert!(temp_dir.path().join(name).exists());
        }

        let info = fs::read_to_string(temp_dir.path().join("info.log")).unwrap();
        assert!(info.contains("[INFO] Test info"));
        assert!(!info.contains("Test error"));
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let logger = Logger::disabled();
        logger.error("goes nowhere");
        assert!(logger.files.is_none());
    }
}
