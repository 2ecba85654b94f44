//! Migration Runner - Resolves and applies migrations
//!
//! Computes which registered migrations are missing from history and runs
//! their forward actions, recording each one as soon as it succeeds.
//!
//! A crash between an action finishing and its history row being written
//! leaves the action applied but unrecorded (or, for rollbacks, reverted but
//! still recorded). Reconcile by inserting or deleting that row by hand
//! before the next run.

use chrono::Utc;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::definitions::{ActionResult, MigrationDirection, MigrationRunResult, MigratorConfig};
use super::registry::MigrationRegistry;
use crate::backends::HistoryProvider;
use crate::error::{MigrateError, MigrateResult, MigrationFailure};

/// Migration engine owning a registry and the history provider it runs against
pub struct Migrator<P: HistoryProvider> {
    provider: P,
    registry: MigrationRegistry<P::Handle>,
    config: MigratorConfig,
}

impl<P: HistoryProvider> Migrator<P> {
    /// Create a new migrator with the default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, MigratorConfig::default())
    }

    /// Create a new migrator using the deadline and duplicate policy of `config`
    pub fn from_config(provider: P, config: &crate::config::MigrateConfig) -> Self {
        Self::with_config(provider, config.migrator_config())
    }

    /// Create a new migrator with a custom configuration
    pub fn with_config(provider: P, config: MigratorConfig) -> Self {
        Self {
            registry: MigrationRegistry::with_policy(config.duplicate_policy),
            provider,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &MigrationRegistry<P::Handle> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MigrationRegistry<P::Handle> {
        &mut self.registry
    }

    /// Register a migration; see [`MigrationRegistry::register`]
    pub fn register<F, R>(&mut self, name: impl Into<String>, forward: F, reverse: R) -> MigrateResult<()>
    where
        F: for<'a> Fn(&'a P::Handle) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
        R: for<'a> Fn(&'a P::Handle) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
    {
        self.registry.register(name, forward, reverse)
    }

    /// Drop every registration, keeping the provider
    pub fn reset(&mut self) {
        self.registry.reset();
    }

    /// Applied migrations, most recently applied first
    pub async fn history(&self) -> MigrateResult<Vec<String>> {
        self.guarded("list_applied", self.provider.list_applied()).await
    }

    /// Registered migrations that are not applied yet, in ascending name order
    pub async fn pending(&self) -> MigrateResult<Vec<String>> {
        let applied = self.history().await?;
        let applied: HashSet<&str> = applied.iter().map(String::as_str).collect();

        let mut pending: Vec<String> = self
            .registry
            .names()
            .filter(|name| !applied.contains(name))
            .map(str::to_string)
            .collect();
        pending.sort();

        tracing::debug!(
            "Resolved {} pending migration(s) ({} registered, {} applied)",
            pending.len(),
            self.registry.len(),
            applied.len()
        );
        Ok(pending)
    }

    /// Run all pending migrations
    ///
    /// Stops at the first failing action or history write. Migrations applied
    /// before the failure stay applied and are reported in
    /// [`MigrationFailure::completed`]; running `apply` again resumes from the
    /// failed one.
    pub async fn apply(&self) -> Result<MigrationRunResult, MigrationFailure> {
        self.apply_until(&CancellationToken::new()).await
    }

    /// Run pending migrations until `cancel` fires
    ///
    /// The token is checked before each migration starts and never while one
    /// is running, so the migration in flight always finishes its action and
    /// history write. A cancelled run fails with [`MigrateError::Cancelled`]
    /// and the names applied so far. Dropping the future instead can cut an
    /// action off part way.
    pub async fn apply_until(
        &self,
        cancel: &CancellationToken,
    ) -> Result<MigrationRunResult, MigrationFailure> {
        let start_time = Instant::now();

        let pending = self.pending().await.map_err(MigrationFailure::before_start)?;
        let skipped_count = self.registry.len() - pending.len();

        let mut applied_migrations = Vec::with_capacity(pending.len());
        for name in pending {
            if cancel.is_cancelled() {
                tracing::info!("Apply cancelled before migration {}", name);
                return Err(MigrationFailure::new(applied_migrations, MigrateError::Cancelled));
            }

            if let Err(error) = self.apply_migration(&name).await {
                tracing::warn!("Stopping at migration {}: {}", name, error);
                return Err(MigrationFailure::new(applied_migrations, error));
            }

            tracing::info!("Applied migration: {}", name);
            applied_migrations.push(name);
        }

        Ok(MigrationRunResult {
            applied_migrations,
            skipped_count,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Run one forward action and record it
    async fn apply_migration(&self, name: &str) -> MigrateResult<()> {
        let migration = self.registry.get(name).ok_or_else(|| MigrateError::not_found(name))?;

        migration
            .up(self.provider.handle())
            .await
            .map_err(|source| MigrateError::action(name, MigrationDirection::Up, source))?;

        self.guarded("mark_applied", self.provider.mark_applied(name, Utc::now()))
            .await
    }

    /// Bootstrap the history table, then run `call`, all within the deadline
    pub(crate) async fn guarded<T, F>(&self, operation: &'static str, call: F) -> MigrateResult<T>
    where
        F: Future<Output = MigrateResult<T>>,
    {
        let timeout = self.config.operation_timeout;
        let bootstrapped = async {
            self.provider.ensure_table().await?;
            call.await
        };

        match tokio::time::timeout(timeout, bootstrapped).await {
            Ok(result) => result,
            Err(_) => Err(MigrateError::Timeout { operation, timeout }),
        }
    }
}

impl<P: HistoryProvider + std::fmt::Debug> std::fmt::Debug for Migrator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("provider", &self.provider)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
