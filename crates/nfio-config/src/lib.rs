//! # nfio-config
//!
//! Configuration for the nf.io error interposer.
//!
//! Loads configuration from:
//! 1. `~/.nfio/errors.toml` (global)
//! 2. the file named by `NFIO_ERRORS_CONFIG` (overrides global)
//! 3. Environment variables (highest priority)
//!
//! The preloaded library reads this once, at load time, and never again.

pub mod logging;

use nfio_errors::{ErrorTable, RangeMode, RangePolicy, TableError, RESERVED_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub use logging::LogLevel;

pub const ENV_CONFIG: &str = "NFIO_ERRORS_CONFIG";
pub const ENV_THRESHOLD: &str = "NFIO_ERRORS_THRESHOLD";
pub const ENV_RANGE_MODE: &str = "NFIO_ERRORS_RANGE_MODE";
pub const ENV_DEBUG: &str = "NFIO_ERRORS_DEBUG";
pub const ENV_LOG_LEVEL: &str = "NFIO_ERRORS_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "NFIO_ERRORS_LOG_FILE";
/// Env-filter directive for the log file; takes precedence over the level.
pub const ENV_LOG_FILTER: &str = "NFIO_ERRORS_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid message table: {0}")]
    Table(#[from] TableError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub range: RangeConfig,
    pub report: ReportConfig,
    pub messages: MessagesConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path().filter(|p| p.exists());
        let explicit = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
        let lookup = |key: &str| std::env::var(key).ok();
        Self::load_with(global.as_deref(), explicit.as_deref(), lookup)
    }

    /// Layer `global`, then `explicit`, then the overrides read through
    /// `lookup`. Every key present in the explicit file wins over the global
    /// file, including keys set back to their default value.
    pub fn load_with<F>(
        global: Option<&Path>,
        explicit: Option<&Path>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // 1. Global config (~/.nfio/errors.toml)
        if let Some(path) = global {
            log_nfio_debug!(
                "loading global config",
                path = tracing::field::debug(path)
            );
            config = Self::load_from(path)?;
        }

        // 2. Explicit config file - overrides global
        if let Some(path) = explicit {
            log_nfio_debug!("loading config", path = tracing::field::debug(path));
            let contents = std::fs::read_to_string(path)?;
            config.merge(toml::from_str(&contents)?);
        }

        // 3. Environment variable overrides
        config.apply_overrides(lookup);

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.nfio/errors.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".nfio/errors.toml"))
    }

    /// Apply every value present in an overriding layer.
    fn merge(&mut self, overlay: ConfigOverlay) {
        if let Some(threshold) = overlay.range.threshold {
            self.range.threshold = threshold;
        }
        if let Some(mode) = overlay.range.mode {
            self.range.mode = mode;
        }
        if let Some(echo_calls) = overlay.report.echo_calls {
            self.report.echo_calls = echo_calls;
        }
        if overlay.messages.table.is_some() {
            self.messages.table = overlay.messages.table;
        }
        if let Some(level) = overlay.logging.level {
            self.logging.level = level;
        }
        if overlay.logging.file.is_some() {
            self.logging.file = overlay.logging.file;
        }
    }

    /// Apply environment overrides read through `lookup`. Unparseable values
    /// are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            match raw.trim().parse() {
                Ok(threshold) => self.range.threshold = threshold,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", ENV_THRESHOLD),
            }
        }
        if let Some(raw) = lookup(ENV_RANGE_MODE) {
            match raw.trim().parse::<RangeMode>() {
                Ok(mode) => self.range.mode = mode,
                Err(()) => warn!(value = %raw, "ignoring invalid {}", ENV_RANGE_MODE),
            }
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            // Presence enables, except explicit falsy values
            self.report.echo_calls = !matches!(raw.trim(), "0" | "false" | "off" | "no");
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            match raw.trim().parse::<LogLevel>() {
                Ok(level) => self.logging.level = level,
                Err(()) => warn!(value = %raw, "ignoring invalid {}", ENV_LOG_LEVEL),
            }
        }
        if let Some(raw) = lookup(ENV_LOG_FILE) {
            if !raw.is_empty() {
                self.logging.file = Some(PathBuf::from(raw));
            }
        }
    }

    pub fn range_policy(&self) -> RangePolicy {
        RangePolicy::new(self.range.threshold, self.range.mode)
    }

    /// The configured table, or the builtin one when no override is set.
    pub fn error_table(&self) -> Result<ErrorTable, ConfigError> {
        match &self.messages.table {
            Some(messages) => {
                let messages = messages.iter().map(String::as_str);
                Ok(ErrorTable::from_messages(messages)?)
            }
            None => Ok(ErrorTable::builtin()),
        }
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// Reserved-range configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// Codes above this value are reserved
    pub threshold: i32,
    /// `signed` compares the code, `absolute` its magnitude
    pub mode: RangeMode,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            threshold: RESERVED_BASE,
            mode: RangeMode::Signed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Print `error: <status> <errnum> <message>` for every error() call
    pub echo_calls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Full replacement for the builtin table; entry 0 is the fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Log file; logging stays off when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            file: None,
        }
    }
}

/// An overriding config file: only the keys it spells out are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    range: RangeOverlay,
    report: ReportOverlay,
    messages: MessagesConfig,
    logging: LoggingOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RangeOverlay {
    threshold: Option<i32>,
    mode: Option<RangeMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReportOverlay {
    echo_calls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingOverlay {
    level: Option<LogLevel>,
    file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.range_policy(), RangePolicy::default());
        assert!(!config.report.echo_calls);
        let table = config.error_table().unwrap();
        assert_eq!(table.len(), ErrorTable::builtin().len());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[range]"));
        assert!(toml_str.contains("threshold = 700"));
        assert!(toml_str.contains("mode = \"signed\""));
        assert!(!toml_str.contains("table"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.messages.table = Some(vec!["Unknown error".into(), "Boom".into()]);
        config.range.mode = RangeMode::Absolute;
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            (ENV_THRESHOLD, "800"),
            (ENV_RANGE_MODE, "absolute"),
            (ENV_DEBUG, "1"),
            (ENV_LOG_LEVEL, "trace"),
            (ENV_LOG_FILE, "/tmp/nfio.log"),
        ]));
        assert_eq!(
            config.range_policy(),
            RangePolicy::new(800, RangeMode::Absolute)
        );
        assert!(config.report.echo_calls);
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/nfio.log")));
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            (ENV_THRESHOLD, "seven hundred"),
            (ENV_RANGE_MODE, "sideways"),
            (ENV_DEBUG, "off"),
            (ENV_LOG_FILE, ""),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_file_merges_over_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        std::fs::write(
            &global,
            r#"
[report]
echo_calls = true

[messages]
table = ["Unknown error", "Hypervisor unreachable"]
"#,
        )
        .unwrap();
        let explicit = dir.path().join("errors.toml");
        std::fs::write(&explicit, "[range]\nthreshold = 900\n").unwrap();

        let config = Config::load_with(Some(global.as_path()), Some(explicit.as_path()), env(&[]))
            .unwrap();

        assert_eq!(config.range.threshold, 900);
        assert_eq!(config.range.mode, RangeMode::Signed);
        assert!(config.report.echo_calls);
        let table = config.error_table().unwrap();
        assert_eq!(table.message(1), c"Hypervisor unreachable");
    }

    #[test]
    fn test_explicit_file_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        std::fs::write(
            &global,
            r#"
[range]
threshold = 900
mode = "absolute"

[report]
echo_calls = true

[logging]
level = "trace"
"#,
        )
        .unwrap();
        let explicit = dir.path().join("errors.toml");
        std::fs::write(
            &explicit,
            r#"
[range]
threshold = 700
mode = "signed"

[report]
echo_calls = false

[logging]
level = "warn"
"#,
        )
        .unwrap();

        let config = Config::load_with(Some(global.as_path()), Some(explicit.as_path()), env(&[]))
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_wins_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("errors.toml");
        std::fs::write(&explicit, "[range]\nthreshold = 900\n").unwrap();

        let lookup = env(&[(ENV_THRESHOLD, "750")]);
        let config = Config::load_with(None, Some(explicit.as_path()), lookup).unwrap();
        assert_eq!(config.range.threshold, 750);
    }

    #[test]
    fn test_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from(&missing),
            Err(ConfigError::Io(_))
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[range\nthreshold = ").unwrap();
        assert!(matches!(
            Config::load_from(&broken),
            Err(ConfigError::Toml(_))
        ));

        let mut config = Config::default();
        config.messages.table = Some(vec![]);
        assert!(matches!(
            config.error_table(),
            Err(ConfigError::Table(TableError::Empty))
        ));
    }
}
