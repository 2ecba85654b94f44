//! Logging setup for migration commands
//!
//! Logs go to stderr so command output on stdout stays clean.

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for migration commands
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Extra per-target directives appended to `level` (e.g. "elif_migrate=debug,sqlx=warn")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Verbose output: engine progress at info, resolution details at debug
    pub fn verbose() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            env_filter: Some("elif_migrate=debug,sqlx=warn".to_string()),
        }
    }

    pub fn with_json(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter string used when `RUST_LOG` is not set
    pub fn filter_directives(&self) -> String {
        match self.env_filter.as_deref() {
            Some(directives) if !directives.trim().is_empty() => format!("{},{}", self.level, directives),
            _ => self.level.clone(),
        }
    }
}

/// Initialize logging; `RUST_LOG` takes precedence over the configured filter
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directives = config.filter_directives();
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directives))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_config() {
        let config = LoggingConfig::verbose().with_json(true);
        assert_eq!(config.level, "info");
        assert!(config.json_format);
        assert_eq!(config.env_filter.as_deref(), Some("elif_migrate=debug,sqlx=warn"));
    }

    #[test]
    fn test_env_filter_override() {
        let config = LoggingConfig::default().with_env_filter("elif_migrate=trace");
        assert_eq!(config.level, "warn");
        assert_eq!(config.filter_directives(), "warn,elif_migrate=trace");
        assert_eq!(LoggingConfig::default().filter_directives(), "warn");
    }
}
