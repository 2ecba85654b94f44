//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system including
//! Migration, AppliedRecord, the run results and the engine configuration.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::registry::DuplicatePolicy;
use crate::error::BoxError;

/// Default name of the history table
pub const DEFAULT_MIGRATIONS_TABLE: &str = "elif_migrations";

/// Default deadline for a single history provider call
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a single forward or reverse action
pub type ActionResult = Result<(), BoxError>;

/// A forward or reverse action run against the provider's live handle
pub type Action<H> = Arc<dyn for<'a> Fn(&'a H) -> BoxFuture<'a, ActionResult> + Send + Sync>;

/// Box an action body so it fits the [`Action`] signature.
///
/// ```ignore
/// registry.register(
///     "20240101-120000-users",
///     |db| action(async move {
///         sqlx::query("CREATE TABLE users (id INTEGER)").execute(db).await?;
///         Ok(())
///     }),
///     |db| action(async move {
///         sqlx::query("DROP TABLE users").execute(db).await?;
///         Ok(())
///     }),
/// )?;
/// ```
pub fn action<'a, F>(body: F) -> BoxFuture<'a, ActionResult>
where
    F: Future<Output = ActionResult> + Send + 'a,
{
    Box::pin(body)
}

/// Represents a registered database migration
pub struct Migration<H> {
    name: String,
    forward: Action<H>,
    reverse: Action<H>,
}

impl<H> Migration<H> {
    /// Create a migration from its forward and reverse actions
    pub fn new<F, R>(name: impl Into<String>, forward: F, reverse: R) -> Self
    where
        F: for<'a> Fn(&'a H) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
        R: for<'a> Fn(&'a H) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            forward: Arc::new(forward),
            reverse: Arc::new(reverse),
        }
    }

    /// Unique name of the migration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the forward action
    pub async fn up(&self, handle: &H) -> ActionResult {
        (self.forward)(handle).await
    }

    /// Run the reverse action
    pub async fn down(&self, handle: &H) -> ActionResult {
        (self.reverse)(handle).await
    }
}

impl<H> Clone for Migration<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            forward: Arc::clone(&self.forward),
            reverse: Arc::clone(&self.reverse),
        }
    }
}

impl<H> fmt::Debug for Migration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Migration status in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRecord {
    /// Migration name
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Configuration for the migration engine
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Deadline for each history provider call, bootstrap included
    pub operation_timeout: Duration,
    /// What registering an already-used name does
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Result of running migrations
#[derive(Debug, Default)]
pub struct MigrationRunResult {
    /// Names of migrations that were applied, in application order
    pub applied_migrations: Vec<String>,
    /// Number of registered migrations that were already applied
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    /// Number of migrations that were applied
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}

/// Result of rolling back migrations
#[derive(Debug, Default)]
pub struct RollbackResult {
    /// Names of migrations that were rolled back, newest first
    pub rolled_back_migrations: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl RollbackResult {
    /// Number of migrations that were rolled back
    pub fn rolled_back_count(&self) -> usize {
        self.rolled_back_migrations.len()
    }
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (run the forward action)
    Up,
    /// Rollback the migration (run the reverse action)
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => write!(f, "up"),
            MigrationDirection::Down => write!(f, "down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_migration_runs_its_actions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let up_calls = Arc::clone(&calls);

        let migration: Migration<()> = Migration::new(
            "20240101-000000-users",
            move |_| {
                let calls = Arc::clone(&up_calls);
                action(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            },
            |_| action(async { Err("cannot revert".into()) }),
        );

        assert_eq!(migration.name(), "20240101-000000-users");
        assert!(migration.up(&()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = migration.down(&()).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot revert");
    }

    #[test]
    fn test_default_config() {
        let config = MigratorConfig::default();
        assert_eq!(config.operation_timeout, Duration::from_secs(30));
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(MigrationDirection::Up.to_string(), "up");
        assert_eq!(MigrationDirection::Down.to_string(), "down");
    }
}
