//! History Provider Backends
//!
//! The [`HistoryProvider`] contract plus the shipped implementations. SQL
//! providers are gated behind the `sqlite`, `postgres` and `mysql` features.

pub mod core;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use self::core::{validate_table_name, HistoryProvider};
pub use memory::MemoryProvider;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
pub use postgres::PostgresProvider;

#[cfg(feature = "mysql")]
pub use mysql::MySqlProvider;
