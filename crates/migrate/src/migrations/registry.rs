//! Migration Registry - In-memory set of known migrations
//!
//! Holds every migration by name. The registry is populated once, before any
//! engine call, and is owned by the [`Migrator`](super::runner::Migrator)
//! that runs it.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::definitions::{ActionResult, Migration};
use crate::error::{MigrateError, MigrateResult};

/// What to do when a name is registered twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the second registration with `DuplicateMigration`
    #[default]
    Reject,
    /// Replace the earlier registration (last one wins)
    Overwrite,
}

/// Registry of migrations keyed by name
pub struct MigrationRegistry<H> {
    migrations: BTreeMap<String, Migration<H>>,
    policy: DuplicatePolicy,
}

impl<H> MigrationRegistry<H> {
    /// Create an empty registry that rejects duplicate names
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            migrations: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a migration under `name`
    ///
    /// The name is not validated. Callers should use sortable, time-prefixed
    /// names (see [`scaffold::migration_name`](super::scaffold::migration_name))
    /// since pending migrations run in lexical order.
    pub fn register<F, R>(&mut self, name: impl Into<String>, forward: F, reverse: R) -> MigrateResult<()>
    where
        F: for<'a> Fn(&'a H) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
        R: for<'a> Fn(&'a H) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
    {
        self.insert(Migration::new(name, forward, reverse))
    }

    /// Add an already built migration
    pub fn insert(&mut self, migration: Migration<H>) -> MigrateResult<()> {
        if self.migrations.contains_key(migration.name()) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(MigrateError::DuplicateMigration {
                        name: migration.name().to_string(),
                    });
                }
                DuplicatePolicy::Overwrite => {
                    tracing::warn!("Overwriting previously registered migration: {}", migration.name());
                }
            }
        }

        self.migrations.insert(migration.name().to_string(), migration);
        Ok(())
    }

    /// Look up a migration by name
    pub fn get(&self, name: &str) -> Option<&Migration<H>> {
        self.migrations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.migrations.contains_key(name)
    }

    /// Registered names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.migrations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Drop every registration
    pub fn reset(&mut self) {
        self.migrations.clear();
    }
}

impl<H> Default for MigrationRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for MigrationRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("names", &self.migrations.keys().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::definitions::action;

    fn noop<'a>() -> BoxFuture<'a, ActionResult> {
        action(async { Ok(()) })
    }

    fn failing<'a>() -> BoxFuture<'a, ActionResult> {
        action(async { Err("second".into()) })
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry: MigrationRegistry<()> = MigrationRegistry::new();
        for name in ["m_003", "m_001", "m_002"] {
            registry.register(name, |_| noop(), |_| noop()).unwrap();
        }

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["m_001", "m_002", "m_003"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("m_002"));
        assert!(registry.get("m_004").is_none());
    }

    #[test]
    fn test_duplicate_rejected_by_default() {
        let mut registry: MigrationRegistry<()> = MigrationRegistry::new();
        registry.register("dup", |_| noop(), |_| noop()).unwrap();

        let err = registry.register("dup", |_| noop(), |_| noop()).unwrap_err();
        assert!(matches!(err, MigrateError::DuplicateMigration { ref name } if name == "dup"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_overwrite_keeps_last() {
        let mut registry: MigrationRegistry<()> = MigrationRegistry::with_policy(DuplicatePolicy::Overwrite);
        registry.register("dup", |_| noop(), |_| noop()).unwrap();
        registry.register("dup", |_| failing(), |_| noop()).unwrap();

        assert_eq!(registry.len(), 1);
        let migration = registry.get("dup").unwrap();
        assert_eq!(migration.up(&()).await.unwrap_err().to_string(), "second");
    }

    #[test]
    fn test_reset_clears_registrations() {
        let mut registry: MigrationRegistry<()> = MigrationRegistry::new();
        registry.register("a", |_| noop(), |_| noop()).unwrap();
        registry.reset();

        assert!(registry.is_empty());
        registry.register("a", |_| noop(), |_| noop()).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
