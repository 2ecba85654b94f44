//! Core History Provider Trait
//!
//! Everything the engine needs from a storage backend: a live handle that
//! migration actions run against, plus bootstrap, list, insert and delete of
//! applied-migration records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MigrateError, MigrateResult};

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid")
});

/// Persistence of applied-migration records
///
/// Implementations do not need to bootstrap their table inside the other
/// methods: the engine calls [`ensure_table`](HistoryProvider::ensure_table)
/// before every list, mark and delete, under the same deadline.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Live database handle passed to migration actions
    type Handle: Send + Sync + 'static;

    /// Get the handle migration actions run against
    fn handle(&self) -> &Self::Handle;

    /// Create the history table if it does not exist yet
    async fn ensure_table(&self) -> MigrateResult<()>;

    /// Applied names, most recently applied first (name descending on ties)
    async fn list_applied(&self) -> MigrateResult<Vec<String>>;

    /// Record `name` as applied at `at`; fails if it is already recorded
    async fn mark_applied(&self, name: &str, at: DateTime<Utc>) -> MigrateResult<()>;

    /// Remove the record for `name`; fails with `NotApplied` if there is none
    async fn delete_applied(&self, name: &str) -> MigrateResult<()>;
}

/// Reject table names that are not plain SQL identifiers
pub fn validate_table_name(table: &str) -> MigrateResult<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(MigrateError::InvalidTableName {
            table: table.to_string(),
        })
    }
}

/// Map an insert failure, turning a uniqueness violation into `AlreadyApplied`
#[cfg_attr(not(any(feature = "sqlite", feature = "postgres", feature = "mysql")), allow(dead_code))]
pub(crate) fn map_insert_error(err: sqlx::Error, name: &str) -> MigrateError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => MigrateError::AlreadyApplied {
            name: name.to_string(),
        },
        _ => MigrateError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("elif_migrations").is_ok());
        assert!(validate_table_name("_history2").is_ok());

        for bad in ["", "2fast", "drop table x;", "schema.table", "name-with-dash"] {
            let err = validate_table_name(bad).unwrap_err();
            assert!(matches!(err, MigrateError::InvalidTableName { .. }), "{bad} accepted");
        }
    }
}
