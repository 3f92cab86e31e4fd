//! Structured logging for the nf.io error interposer.
//!
//! The interposer lives inside someone else's process, so it never writes
//! log output to the host's stdout/stderr. Events go to a file when one is
//! configured and are dropped otherwise.
//!
//! # Usage
//!
//! ```ignore
//! use nfio_config::log_nfio_debug;
//!
//! log_nfio_debug!("Delegating strerror", code = 5);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Component identifier attached to every event
pub const COMPONENT: &str = nfio_errors::LOG_COMPONENT;

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = if s.eq_ignore_ascii_case("trace") {
            LogLevel::Trace
        } else if s.eq_ignore_ascii_case("debug") {
            LogLevel::Debug
        } else if s.eq_ignore_ascii_case("info") {
            LogLevel::Info
        } else if s.eq_ignore_ascii_case("warn") || s.eq_ignore_ascii_case("warning") {
            LogLevel::Warn
        } else if s.eq_ignore_ascii_case("error") {
            LogLevel::Error
        } else {
            return Err(());
        };
        Ok(level)
    }
}

#[macro_export]
macro_rules! log_nfio_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::COMPONENT, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_nfio_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::COMPONENT, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_nfio_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::COMPONENT, $($key = $value,)* $msg)
    };
}

/// Install a file-backed subscriber at `level`.
///
/// `NFIO_ERRORS_LOG` (an env-filter directive) takes precedence over
/// `level`. Returns `false` when the file cannot be used or the process
/// already has a global subscriber; an existing subscriber is never replaced.
pub fn init_file_logging(level: LogLevel, file: &Path) -> bool {
    use tracing_subscriber::EnvFilter;

    let (Some(dir), Some(name)) = (file.parent(), file.file_name()) else {
        return false;
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    if !dir.is_dir() {
        return false;
    }

    let env_filter = EnvFilter::try_from_env(crate::ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let appender = tracing_appender::rolling::never(dir, name);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("TRACE".parse(), Ok(LogLevel::Trace));
        assert_eq!("warning".parse(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Debug.as_filter(), "debug");
    }

    #[test]
    fn test_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nope").join("nfio.log");
        assert!(!init_file_logging(LogLevel::Info, &file));
    }

    #[test]
    fn test_file_logging_writes_component() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nfio.log");
        assert!(init_file_logging(LogLevel::Debug, &file));
        // One global subscriber per process
        assert!(!init_file_logging(LogLevel::Debug, &file));

        crate::log_nfio_info!("interposer ready", threshold = 700);
        crate::log_nfio_debug!("delegating", symbol = "strerror");

        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("interposer ready"));
        assert!(contents.contains("component=\"NFIO\""));
        assert!(contents.contains("threshold=700"));
        assert!(contents.contains("symbol=\"strerror\""));
    }
}
