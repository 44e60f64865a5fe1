//! Configuration settings for the audit trail.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::AuditError;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub storage: StorageConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub masking: MaskingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the day-partitioned audit files.
    pub dir: PathBuf,
}

/// Retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Number of days a day file is kept.
    #[serde(default = "default_retention_days")]
    pub days: u32,
    /// UTC hour-of-day at which the daily cleanup sweep triggers.
    #[serde(default = "default_cleanup_hour")]
    pub cleanup_hour_utc: u32,
}

/// Masking configuration.
///
/// The additional terms extend the built-in sensitive-key list; they never
/// replace it, so extending the config can only redact more.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MaskingConfig {
    /// Extra sensitive-key terms (case-insensitive substrings).
    #[serde(default)]
    pub additional_terms: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_retention_days() -> u32 {
    30
}

fn default_cleanup_hour() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
            cleanup_hour_utc: default_cleanup_hour(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| AuditError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), AuditError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(AuditError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(AuditError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.retention.days == 0 {
            return Err(AuditError::Config {
                message: "Retention days must be at least 1".to_string(),
            });
        }

        if self.retention.cleanup_hour_utc > 23 {
            return Err(AuditError::Config {
                message: format!(
                    "Invalid cleanup hour {}. Must be 0-23",
                    self.retention.cleanup_hour_utc
                ),
            });
        }

        Ok(())
    }
}
