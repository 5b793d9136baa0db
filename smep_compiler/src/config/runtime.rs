// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerPreferences {
    /// Whether to emit a warning when a value token itself looks like a flag
    pub warn_on_suspicious_pairs: bool,

    /// Whether to count inferred value types in the tokenizer metrics
    pub collect_type_metrics: bool,

    /// Whether to log each inferred value at debug level
    pub log_inferred_values: bool,
}

impl Default for TokenizerPreferences {
    fn default() -> Self {
        Self {
            warn_on_suspicious_pairs: env::var(env_vars::TOKENIZER_WARN_SUSPICIOUS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            collect_type_metrics: env::var(env_vars::TOKENIZER_TYPE_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_inferred_values: env::var(env_vars::TOKENIZER_LOG_VALUES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrPreferences {
    /// Whether to log every node attachment during threading
    pub log_threading_details: bool,

    /// Whether to reject plain keys that shadow an object root
    pub reject_conflicting_keys: bool,
}

impl Default for IrPreferences {
    fn default() -> Self {
        Self {
            log_threading_details: env::var(env_vars::IR_LOG_THREADING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            reject_conflicting_keys: env::var(env_vars::IR_REJECT_CONFLICTS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializePreferences {
    /// Whether to log each constructed object
    pub log_constructions: bool,
}

impl Default for MaterializePreferences {
    fn default() -> Self {
        Self {
            log_constructions: env::var(env_vars::MATERIALIZE_LOG_CONSTRUCTIONS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Minimum level passed to the logging service
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse a level name or its numeric rank
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Errors loading a preferences file
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tokenizer: TokenizerPreferences,
    pub ir: IrPreferences,
    pub materialize: MaterializePreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse preferences from TOML; missing sections fall back to environment defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for runtime configuration
pub mod env_vars {
    // Tokenizer
    pub const TOKENIZER_WARN_SUSPICIOUS: &str = "SMEP_TOKENIZER_WARN_SUSPICIOUS";
    pub const TOKENIZER_TYPE_METRICS: &str = "SMEP_TOKENIZER_TYPE_METRICS";
    pub const TOKENIZER_LOG_VALUES: &str = "SMEP_TOKENIZER_LOG_VALUES";

    // IR
    pub const IR_LOG_THREADING: &str = "SMEP_IR_LOG_THREADING";
    pub const IR_REJECT_CONFLICTS: &str = "SMEP_IR_REJECT_CONFLICTS";

    // Materializer
    pub const MATERIALIZE_LOG_CONSTRUCTIONS: &str = "SMEP_MATERIALIZE_LOG_CONSTRUCTIONS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "SMEP_LOGGING_USE_STRUCTURED";
    pub const LOGGING_MIN_LEVEL: &str = "SMEP_LOGGING_MIN_LEVEL";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_partial_toml_keeps_other_sections() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [tokenizer]
            warn_on_suspicious_pairs = false

            [logging]
            min_log_level = "debug"
            "#,
        )
        .unwrap();

        assert!(!config.tokenizer.warn_on_suspicious_pairs);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = RuntimeConfig::from_toml_str("[tokenizer\nbroken");
        assert!(matches!(result, Err(ConfigLoadError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ir]\nreject_conflicting_keys = false").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert!(!config.ir.reject_conflicting_keys);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RuntimeConfig::from_file(Path::new("/nonexistent/smep.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/smep.toml"));
    }
}
