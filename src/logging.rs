//! Logging facility for the command-line tool
//!
//! Installs a minimal backend for the `log` crate that writes
//! "[LEVEL] message" lines to stderr. Library code only talks to the
//! facade, so an embedding application is free to bring its own backend
//! and skip [`init`] entirely.

use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

/// Global logger instance installed by [`init`]
static LOGGER: Logger = Logger {
    inner: Mutex::new(()),
};

/// Logger serializing writes so lines are not interleaved across threads
struct Logger {
    inner: Mutex<()>,
}

impl Log for Logger {
    /// Determines if a log message should be processed based on its level
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Formats messages as "[LEVEL] message" on stderr
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _guard = self.inner.lock();
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    /// Flush buffered logs (no-op, stderr is unbuffered)
    fn flush(&self) {}
}

/// Initializes logging for the binary.
///
/// The level defaults to Info in release builds and Debug in debug
/// builds, and can be overridden through the `FATIMG_LOG` environment
/// variable (error/warn/info/debug/trace/off). Calling this twice is
/// harmless; the second installation is ignored.
pub fn init() {
    let default = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let level = std::env::var("FATIMG_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(default);

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
