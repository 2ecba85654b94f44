//! Postgres and MySQL providers against live servers
//!
//! Each test returns early unless its URL variable is set, e.g.
//! `ELIF_MIGRATE_POSTGRES_URL=postgres://localhost/elif_test cargo test --features postgres`.
#![cfg(any(feature = "postgres", feature = "mysql"))]

use chrono::{Duration, TimeZone, Utc};
use elif_migrate::{HistoryProvider, MigrateError};

/// Fresh table per run so parallel runs against one server do not collide
fn table_name(prefix: &str) -> String {
    format!("elif_migrate_{}_{}", prefix, Utc::now().timestamp_micros())
}

async fn check_history_semantics<P: HistoryProvider>(provider: &P) {
    provider.ensure_table().await.unwrap();
    provider.ensure_table().await.unwrap();
    assert!(provider.list_applied().await.unwrap().is_empty());

    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    provider.mark_applied("b", base).await.unwrap();
    provider.mark_applied("a", base).await.unwrap();
    provider.mark_applied("c", base + Duration::seconds(1)).await.unwrap();
    assert_eq!(provider.list_applied().await.unwrap(), vec!["c", "b", "a"]);

    let err = provider.mark_applied("a", Utc::now()).await.unwrap_err();
    assert!(matches!(err, MigrateError::AlreadyApplied { ref name } if name == "a"));

    let err = provider.delete_applied("never").await.unwrap_err();
    assert!(matches!(err, MigrateError::NotApplied { .. }));

    for name in ["a", "b", "c"] {
        provider.delete_applied(name).await.unwrap();
    }
    assert!(provider.list_applied().await.unwrap().is_empty());
}

#[cfg(feature = "postgres")]
#[tokio::test]
async fn test_postgres_history() {
    use elif_migrate::PostgresProvider;

    let Ok(url) = std::env::var("ELIF_MIGRATE_POSTGRES_URL") else {
        return;
    };
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    let table = table_name("pg");
    let provider = PostgresProvider::with_table(pool.clone(), table.clone()).unwrap();

    check_history_semantics(&provider).await;
    sqlx::query(&format!("DROP TABLE {}", table)).execute(&pool).await.unwrap();
}

#[cfg(feature = "mysql")]
#[tokio::test]
async fn test_mysql_history() {
    use elif_migrate::MySqlProvider;

    let Ok(url) = std::env::var("ELIF_MIGRATE_MYSQL_URL") else {
        return;
    };
    let pool = sqlx::MySqlPool::connect(&url).await.unwrap();
    let table = table_name("mysql");
    let provider = MySqlProvider::with_table(pool.clone(), table.clone()).unwrap();

    check_history_semantics(&provider).await;
    sqlx::query(&format!("DROP TABLE {}", table)).execute(&pool).await.unwrap();
}
