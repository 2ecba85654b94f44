//! Error types for the migration system
//!
//! Errors fall into three groups: storage errors raised by a history
//! provider, errors returned by a migration's own forward or reverse action,
//! and operator errors such as reverting a migration that is no longer
//! registered.

use std::time::Duration;
use thiserror::Error;

use crate::migrations::definitions::MigrationDirection;

/// Boxed error returned by migration actions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("History provider error: {message}")]
    Provider { message: String },

    #[error("Migration already applied: {name}")]
    AlreadyApplied { name: String },

    #[error("Migration is not recorded as applied: {name}")]
    NotApplied { name: String },

    #[error("History provider timed out after {timeout:?} during {operation}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Invalid migrations table name: '{table}'")]
    InvalidTableName { table: String },

    #[error("Migration '{name}' failed while running {direction}: {source}")]
    Action {
        name: String,
        direction: MigrationDirection,
        source: BoxError,
    },

    #[error("Migration run cancelled")]
    Cancelled,

    #[error("Migration not found in registry: {name}")]
    MigrationNotFound { name: String },

    #[error("Migration is already registered: {name}")]
    DuplicateMigration { name: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create a new provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap an error returned by a migration action
    pub fn action(name: impl Into<String>, direction: MigrationDirection, source: BoxError) -> Self {
        Self::Action {
            name: name.into(),
            direction,
            source,
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::MigrationNotFound { name: name.into() }
    }

    /// Check if the error came from a migration action rather than storage
    pub fn is_action_error(&self) -> bool {
        matches!(self, MigrateError::Action { .. })
    }

    /// Check if the run was stopped by its cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrateError::Cancelled)
    }

    /// Check if the error is a provider deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, MigrateError::Timeout { .. })
    }
}

/// A run that stopped part-way through
///
/// `completed` holds the names that were fully processed (action run and
/// history updated) before `error` occurred. Those stay recorded; nothing is
/// compensated.
#[derive(Debug, Error)]
#[error("migration run stopped after {} completed migration(s): {error}", .completed.len())]
pub struct MigrationFailure {
    pub completed: Vec<String>,
    #[source]
    pub error: MigrateError,
}

impl MigrationFailure {
    pub fn new(completed: Vec<String>, error: MigrateError) -> Self {
        Self { completed, error }
    }

    /// Failure raised before any migration was attempted
    pub fn before_start(error: MigrateError) -> Self {
        Self::new(Vec::new(), error)
    }

    pub fn into_error(self) -> MigrateError {
        self.error
    }
}
