//! Optional `tracing` setup for hosts and tests.
//!
//! The library only emits events; it never installs a subscriber itself.
//! Hosts that have no subscriber of their own can call [`init_logging`]
//! once at startup.

use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Environment variable overriding the log filter (`RUST_LOG` syntax).
pub const LOG_ENV: &str = "UHF_LOG";

/// How much to log, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    /// No subscriber is installed.
    #[default]
    Silent,
    /// Compact stderr output at `info`.
    Development,
    /// Verbose output at `debug` with threads and source locations.
    Debug,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Install a global subscriber for `mode`.
///
/// The filter comes from `UHF_LOG`, then `RUST_LOG`, then the mode's
/// default level.
///
/// # Errors
///
/// Returns `LoggingError::TracingInit` if a global subscriber is already
/// installed and `LoggingError::InvalidFilter` for a malformed filter.
///
/// ```rust,ignore
/// uhf_reader::logging::init_logging(LoggingMode::Development)?;
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = env_filter("info")?;
            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = env_filter("debug")?;
            Registry::default()
                .with(
                    fmt::layer()
                        .with_thread_names(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

fn env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter(format!("{directives}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_default_mode_is_silent() {
        assert_eq!(LoggingMode::default(), LoggingMode::Silent);
    }

    #[test]
    fn test_error_display() {
        let err = LoggingError::InvalidFilter("=x".to_string());
        assert_eq!(err.to_string(), "Invalid log filter: =x");
    }
}
