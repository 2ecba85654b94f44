//! # elif-migrate: Schema migrations for elif.rs
//!
//! Tracks named, ordered schema changes and the history of which ones have
//! run. Pending migrations are applied in ascending name order and recorded
//! one by one; rollbacks revert the most recently applied migrations first.
//!
//! ```ignore
//! use elif_migrate::{action, Migrator, SqliteProvider};
//!
//! let provider = SqliteProvider::connect("sqlite://app.db").await?;
//! let mut migrator = Migrator::new(provider);
//! migrator.register(
//!     "20240101-120000-create-users",
//!     |db| action(async move {
//!         sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)").execute(db).await?;
//!         Ok(())
//!     }),
//!     |db| action(async move {
//!         sqlx::query("DROP TABLE users").execute(db).await?;
//!         Ok(())
//!     }),
//! )?;
//!
//! let result = migrator.apply().await?;
//! println!("applied {:?}", result.applied_migrations);
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod migrations;

pub use backends::{validate_table_name, HistoryProvider, MemoryProvider};
#[cfg(feature = "sqlite")]
pub use backends::SqliteProvider;
#[cfg(feature = "postgres")]
pub use backends::PostgresProvider;
#[cfg(feature = "mysql")]
pub use backends::MySqlProvider;
pub use config::MigrateConfig;
pub use error::{BoxError, MigrateError, MigrateResult, MigrationFailure};
pub use migrations::*;
pub use tokio_util::sync::CancellationToken;
