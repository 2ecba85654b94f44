//! Migration `20240309-070501-hello` for the `migrations` module.

use elif_migrate::{action, MigrateResult, MigrationRegistry};

pub const NAME: &str = "20240309-070501-hello";

pub fn register<H: Send + Sync + 'static>(registry: &mut MigrationRegistry<H>) -> MigrateResult<()> {
    registry.register(
        NAME,
        |_db| {
            action(async move {
                // TODO: write up logic
                Ok(())
            })
        },
        |_db| {
            action(async move {
                // TODO: write down logic
                Ok(())
            })
        },
    )
}
