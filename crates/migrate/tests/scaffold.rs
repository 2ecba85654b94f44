//! Generated migration source compiles and registers like a hand-written one

#[path = "fixtures/m20240309_070501_hello.rs"]
mod m20240309_070501_hello;

use chrono::{TimeZone, Utc};
use elif_migrate::{migration_name_from_source, template_at, MemoryProvider, Migrator};

const FIXTURE: &str = include_str!("fixtures/m20240309_070501_hello.rs");

#[test]
fn test_fixture_matches_generated_template() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    let scaffold = template_at("", "hello", now);

    assert_eq!(scaffold.file_stem, "m20240309_070501_hello");
    assert_eq!(scaffold.content, FIXTURE);
    assert_eq!(
        migration_name_from_source(FIXTURE).as_deref(),
        Some(m20240309_070501_hello::NAME)
    );
}

#[tokio::test]
async fn test_generated_migration_registers_and_runs() {
    let mut migrator = Migrator::new(MemoryProvider::new());
    m20240309_070501_hello::register(migrator.registry_mut()).unwrap();

    assert!(migrator.registry().contains("20240309-070501-hello"));
    assert_eq!(migrator.pending().await.unwrap(), vec!["20240309-070501-hello"]);

    let result = migrator.apply().await.unwrap();
    assert_eq!(result.applied_migrations, vec![m20240309_070501_hello::NAME]);
    assert_eq!(migrator.history().await.unwrap(), vec![m20240309_070501_hello::NAME]);

    let result = migrator.down(1).await.unwrap();
    assert_eq!(result.rolled_back_migrations, vec![m20240309_070501_hello::NAME]);
    assert!(migrator.history().await.unwrap().is_empty());
}
