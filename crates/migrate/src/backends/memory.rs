//! In-memory History Provider
//!
//! Keeps applied records in process memory. Used by tests and by
//! applications whose migrations touch something other than a SQL database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::core::HistoryProvider;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::definitions::AppliedRecord;

/// History provider backed by a `Vec` behind a mutex; its handle is `()`
#[derive(Debug, Default)]
pub struct MemoryProvider {
    records: Mutex<Vec<AppliedRecord>>,
    table_created: AtomicBool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider that already holds `records`
    pub fn with_records(records: impl IntoIterator<Item = AppliedRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            table_created: AtomicBool::new(true),
        }
    }

    /// Whether `ensure_table` has run (or the provider was seeded)
    pub fn table_created(&self) -> bool {
        self.table_created.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored records in insertion order
    pub fn records(&self) -> MigrateResult<Vec<AppliedRecord>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> MigrateResult<MutexGuard<'_, Vec<AppliedRecord>>> {
        self.records
            .lock()
            .map_err(|_| MigrateError::provider("in-memory history lock poisoned"))
    }
}

#[async_trait]
impl HistoryProvider for MemoryProvider {
    type Handle = ();

    fn handle(&self) -> &() {
        &()
    }

    async fn ensure_table(&self) -> MigrateResult<()> {
        self.table_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_applied(&self) -> MigrateResult<Vec<String>> {
        let mut records = self.lock()?.clone();
        records.sort_by(|a, b| {
            b.applied_at
                .cmp(&a.applied_at)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(records.into_iter().map(|r| r.name).collect())
    }

    async fn mark_applied(&self, name: &str, at: DateTime<Utc>) -> MigrateResult<()> {
        let mut records = self.lock()?;
        if records.iter().any(|r| r.name == name) {
            return Err(MigrateError::AlreadyApplied {
                name: name.to_string(),
            });
        }

        records.push(AppliedRecord {
            name: name.to_string(),
            applied_at: at,
        });
        Ok(())
    }

    async fn delete_applied(&self, name: &str) -> MigrateResult<()> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.name != name);

        if records.len() == before {
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
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_name_tiebreak() {
        let provider = MemoryProvider::new();
        provider.mark_applied("b", at(0)).await.unwrap();
        provider.mark_applied("a", at(0)).await.unwrap();
        provider.mark_applied("c", at(5)).await.unwrap();

        assert_eq!(provider.list_applied().await.unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_mark_twice_fails() {
        let provider = MemoryProvider::new();
        provider.mark_applied("a", at(0)).await.unwrap();

        let err = provider.mark_applied("a", at(1)).await.unwrap_err();
        assert!(matches!(err, MigrateError::AlreadyApplied { .. }));
        assert_eq!(provider.records().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let provider = MemoryProvider::new();
        let err = provider.delete_applied("ghost").await.unwrap_err();
        assert!(matches!(err, MigrateError::NotApplied { ref name } if name == "ghost"));
    }

    #[tokio::test]
    async fn test_ensure_table_flag() {
        let provider = MemoryProvider::new();
        assert!(!provider.table_created());
        provider.ensure_table().await.unwrap();
        assert!(provider.table_created());
    }
}
