//! Migration Rollback - Reverts the most recently applied migrations
//!
//! Rollback walks history newest first, running each reverse action and then
//! deleting its history row.

use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::definitions::{MigrationDirection, RollbackResult};
use super::runner::Migrator;
use crate::backends::HistoryProvider;
use crate::error::{MigrateError, MigrateResult, MigrationFailure};

impl<P: HistoryProvider> Migrator<P> {
    /// Roll back the `count` most recently applied migrations
    ///
    /// `count == 0`, or a count larger than the history, rolls back
    /// everything. An empty history is not an error. Every migration being
    /// reverted must still be registered; an unregistered one stops the run
    /// with `MigrationNotFound` before its reverse action would run.
    pub async fn down(&self, count: usize) -> Result<RollbackResult, MigrationFailure> {
        self.down_until(count, &CancellationToken::new()).await
    }

    /// Roll back like [`down`](Self::down), stopping between migrations once
    /// `cancel` fires
    ///
    /// A reverse action that has started always runs to completion and has
    /// its history row deleted before the token is looked at again.
    pub async fn down_until(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<RollbackResult, MigrationFailure> {
        let start_time = Instant::now();

        let applied = self.history().await.map_err(MigrationFailure::before_start)?;
        if applied.is_empty() {
            tracing::debug!("Nothing to roll back");
            return Ok(RollbackResult {
                rolled_back_migrations: Vec::new(),
                execution_time_ms: start_time.elapsed().as_millis(),
            });
        }

        let limit = if count == 0 || count >= applied.len() {
            applied.len()
        } else {
            count
        };

        let mut rolled_back_migrations = Vec::with_capacity(limit);
        for name in applied.into_iter().take(limit) {
            if cancel.is_cancelled() {
                tracing::info!("Rollback cancelled before migration {}", name);
                return Err(MigrationFailure::new(rolled_back_migrations, MigrateError::Cancelled));
            }

            if let Err(error) = self.rollback_migration(&name).await {
                tracing::warn!("Stopping rollback at migration {}: {}", name, error);
                return Err(MigrationFailure::new(rolled_back_migrations, error));
            }

            tracing::info!("Rolled back migration: {}", name);
            rolled_back_migrations.push(name);
        }

        Ok(RollbackResult {
            rolled_back_migrations,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Roll back every applied migration
    pub async fn down_all(&self) -> Result<RollbackResult, MigrationFailure> {
        self.down(0).await
    }

    /// Run one reverse action and remove its record
    async fn rollback_migration(&self, name: &str) -> MigrateResult<()> {
        let migration = self
            .registry()
            .get(name)
            .ok_or_else(|| MigrateError::not_found(name))?;

        migration
            .down(self.provider().handle())
            .await
            .map_err(|source| MigrateError::action(name, MigrationDirection::Down, source))?;

        self.guarded("delete_applied", self.provider().delete_applied(name))
            .await
    }
}
