//! PostgreSQL History Provider
//!
//! Stores applied migrations in a single table using sqlx's PostgreSQL driver.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::core::{map_insert_error, validate_table_name, HistoryProvider};
use crate::config::MigrateConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::definitions::DEFAULT_MIGRATIONS_TABLE;

/// PostgreSQL history provider; migration actions receive the pool
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    pool: PgPool,
    table: String,
}

impl PostgresProvider {
    /// Create a provider using the default history table
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }

    /// Create a provider using a custom history table
    pub fn with_table(pool: PgPool, table: impl Into<String>) -> MigrateResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    /// Connect to `database_url` with a small pool; migrations run one at a time
    pub async fn connect(database_url: &str) -> MigrateResult<Self> {
        if !database_url.starts_with("postgresql://") && !database_url.starts_with("postgres://") {
            return Err(MigrateError::configuration("Invalid PostgreSQL URL scheme"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Connect to the database named by `config` and use its history table
    pub async fn from_config(config: &MigrateConfig) -> MigrateResult<Self> {
        validate_table_name(&config.table)?;
        let database_url = config.database_url()?;
        let provider = Self::connect(&database_url).await?;
        Self::with_table(provider.pool, config.table.clone())
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl HistoryProvider for PostgresProvider {
    type Handle = PgPool;

    fn handle(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_table(&self) -> MigrateResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    \
                name VARCHAR(500) NOT NULL CONSTRAINT {table}_pk PRIMARY KEY,\n    \
                time TIMESTAMP\n\
            )",
            table = self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_applied(&self) -> MigrateResult<Vec<String>> {
        let sql = format!("SELECT name FROM {} ORDER BY time DESC, name DESC", self.table);
        let names = sqlx::query_scalar::<_, String>(&sql).fetch_all(&self.pool).await?;
        Ok(names)
    }

    async fn mark_applied(&self, name: &str, at: DateTime<Utc>) -> MigrateResult<()> {
        let sql = format!("INSERT INTO {} (name, time) VALUES ($1, $2)", self.table);
        sqlx::query(&sql)
            .bind(name)
            .bind(at.naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, name))?;
        Ok(())
    }

    async fn delete_applied(&self, name: &str) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE name = $1", self.table);
        let result = sqlx::query(&sql).bind(name).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(MigrateError::NotApplied {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/elif_migrate_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_with_table_validates_name() {
        let provider = PostgresProvider::with_table(lazy_pool(), "app_history").unwrap();
        assert_eq!(provider.table(), "app_history");
        assert_eq!(PostgresProvider::new(lazy_pool()).table(), "elif_migrations");

        let err = PostgresProvider::with_table(lazy_pool(), "app-history").unwrap_err();
        assert!(matches!(err, MigrateError::InvalidTableName { .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_other_schemes() {
        let err = PostgresProvider::connect("mysql://localhost/app").await.unwrap_err();
        assert!(matches!(err, MigrateError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_from_config_checks_table_before_connecting() {
        let config = MigrateConfig {
            table: "bad table".to_string(),
            ..MigrateConfig::default()
        };
        let err = PostgresProvider::from_config(&config).await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidTableName { .. }));
    }
}
