//! Logging module for terminal based output control.
//!
//! Contains a custom logging implementation which writes everything to
//! stderr, as stdout belongs to the remote helper protocol spoken between
//! git and the transport we hand over to.
use logger::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use std::env;
use std::str::FromStr;

/// Environment variable used to raise the logging level.
pub const LOG_ENV: &str = "GIT_REMOTE_CODECOMMIT_LOG";

/// Basic logger instance writing to stderr.
struct BasicLogger {
    verbose: bool,
}

// Basic logging implementation.
impl Log for BasicLogger {
    /// Returns enabled only for git-remote-codecommit modules.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("git_remote_codecommit")
    }

    /// Logs out a `Record` when logging is enabled.
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if record.metadata().level() == Level::Error {
                eprintln!("{}", record.args());
            } else if self.verbose {
                eprintln!("[{}] {}", record.level(), record.args());
            }
        }
    }

    /// Flushes this logger.
    fn flush(&self) {}
}

/// Parses a level filter from the logging variable value.
///
/// Anything unrecognised falls back to errors only.
fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .map(|level| level.max(LevelFilter::Error))
        .unwrap_or(LevelFilter::Error)
}

/// Initializes the logger based on the environment.
///
/// Errors are always written; everything else requires the level to be
/// raised via `GIT_REMOTE_CODECOMMIT_LOG`.
pub fn init() -> Result<(), SetLoggerError> {
    let level = parse_level(env::var(LOG_ENV).ok().as_deref());
    let logger = Box::new(BasicLogger {
        verbose: level > LevelFilter::Error,
    });
    log::set_boxed_logger(logger).map(|_| log::set_max_level(level))
}

#[cfg(test)]
mod tests {
    use logger::LevelFilter;

    #[test]
    fn parsing_log_levels() {
        assert_eq!(super::parse_level(None), LevelFilter::Error);
        assert_eq!(super::parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(super::parse_level(Some(" TRACE ")), LevelFilter::Trace);
        assert_eq!(super::parse_level(Some("nonsense")), LevelFilter::Error);
    }

    #[test]
    fn never_disabling_errors() {
        assert_eq!(super::parse_level(Some("off")), LevelFilter::Error);
    }
}
