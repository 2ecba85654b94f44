//! Migration configuration
//!
//! Loaded from a YAML file, then overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backends::validate_table_name;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::definitions::{MigratorConfig, DEFAULT_MIGRATIONS_TABLE};
use crate::migrations::registry::DuplicatePolicy;
use crate::migrations::scaffold::DEFAULT_PACKAGE;

/// Environment variable overriding the history table name
pub const TABLE_ENV: &str = "ELIF_MIGRATIONS_TABLE";

/// Environment variable overriding the provider deadline, in seconds
pub const TIMEOUT_ENV: &str = "ELIF_MIGRATIONS_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Name of the environment variable holding the database URL
    pub database_url_env: String,
    /// Directory that contains the migrations package
    pub migrations_dir: PathBuf,
    /// Package (module) new migrations are created in
    pub package: String,
    /// History table name
    pub table: String,
    /// Deadline for each history provider call
    pub timeout_secs: u64,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            database_url_env: "DATABASE_URL".to_string(),
            migrations_dir: PathBuf::from("src"),
            package: DEFAULT_PACKAGE.to_string(),
            table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            timeout_secs: 30,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl MigrateConfig {
    /// Load configuration from a YAML file and apply environment overrides
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: MigrateConfig = serde_yaml::from_str(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> MigrateResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> MigrateResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, then validate
    pub fn apply_overrides<F>(&mut self, lookup: F) -> MigrateResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(table) = lookup(TABLE_ENV) {
            self.table = table;
        }

        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                MigrateError::configuration(format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, timeout))
            })?;
        }

        self.validate()
    }

    pub fn validate(&self) -> MigrateResult<()> {
        validate_table_name(&self.table)?;

        if self.timeout_secs == 0 {
            return Err(MigrateError::configuration("timeout_secs must be greater than zero"));
        }
        if self.database_url_env.trim().is_empty() {
            return Err(MigrateError::configuration("database_url_env must not be empty"));
        }
        Ok(())
    }

    /// Read the database URL from the configured environment variable
    pub fn database_url(&self) -> MigrateResult<String> {
        std::env::var(&self.database_url_env).map_err(|_| {
            MigrateError::configuration(format!("Environment variable {} is not set", self.database_url_env))
        })
    }

    /// Directory new migration files are written to
    pub fn package_dir(&self) -> PathBuf {
        self.migrations_dir.join(&self.package)
    }

    pub fn migrator_config(&self) -> MigratorConfig {
        MigratorConfig {
            operation_timeout: Duration::from_secs(self.timeout_secs),
            duplicate_policy: self.duplicate_policy,
        }
    }
}
