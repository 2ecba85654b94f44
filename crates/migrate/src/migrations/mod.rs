//! Migration System
//!
//! Registry, resolution, apply and rollback engines, plus the scaffold used
//! to generate new migration files.

pub mod definitions;
pub mod registry;
pub mod rollback;
pub mod runner;
pub mod scaffold;

pub use definitions::*;
pub use registry::{DuplicatePolicy, MigrationRegistry};
pub use runner::Migrator;
pub use scaffold::{
    create_migration_file, migration_name, migration_name_from_source, template, template_at, Scaffold, DEFAULT_PACKAGE,
};
