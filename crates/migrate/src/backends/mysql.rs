//! MySQL History Provider

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;

use super::core::{map_insert_error, validate_table_name, HistoryProvider};
use crate::config::MigrateConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::definitions::DEFAULT_MIGRATIONS_TABLE;

/// MySQL history provider; migration actions receive the pool
#[derive(Debug, Clone)]
pub struct MySqlProvider {
    pool: MySqlPool,
    table: String,
}

impl MySqlProvider {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }

    pub fn with_table(pool: MySqlPool, table: impl Into<String>) -> MigrateResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    pub async fn connect(database_url: &str) -> MigrateResult<Self> {
        let pool = MySqlPool::connect(database_url).await?;
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
impl HistoryProvider for MySqlProvider {
    type Handle = MySqlPool;

    fn handle(&self) -> &MySqlPool {
        &self.pool
    }

    async fn ensure_table(&self) -> MigrateResult<()> {
        // TIMESTAMP NULL keeps MySQL from adding ON UPDATE CURRENT_TIMESTAMP
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                name VARCHAR(500) NOT NULL,\n    \
                time TIMESTAMP(6) NULL,\n    \
                PRIMARY KEY (name)\n\
            ) ENGINE=InnoDB",
            self.table
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
        let sql = format!("INSERT INTO {} (name, time) VALUES (?, ?)", self.table);
        sqlx::query(&sql)
            .bind(name)
            .bind(at.naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, name))?;
        Ok(())
    }

    async fn delete_applied(&self, name: &str) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE name = ?", self.table);
        let result = sqlx::query(&sql).bind(name).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(MigrateError::NotApplied {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
