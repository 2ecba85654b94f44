use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

use elif_migrate::{
    create_migration_file, CancellationToken, HistoryProvider, MigrateConfig, Migrator, DEFAULT_PACKAGE,
};

use super::MigrateCommand;

/// Settings shared by every command of one invocation
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Supplies the package and directory `create` falls back to
    pub config: Option<MigrateConfig>,
    /// Stops `apply` and `down` between migrations once cancelled
    pub cancel: CancellationToken,
}

impl RunOptions {
    pub fn with_config(mut self, config: MigrateConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Execute `command` against `migrator`, writing user-facing output to `out`
///
/// When a run stops part way, the migrations that did complete are printed
/// before the error is returned.
pub async fn run<P, W>(migrator: &Migrator<P>, command: &MigrateCommand, out: &mut W) -> anyhow::Result<()>
where
    P: HistoryProvider,
    W: Write,
{
    run_with(migrator, command, &RunOptions::default(), out).await
}

/// Execute `command` with a config fallback for `create` and a cancellation token
pub async fn run_with<P, W>(
    migrator: &Migrator<P>,
    command: &MigrateCommand,
    options: &RunOptions,
    out: &mut W,
) -> anyhow::Result<()>
where
    P: HistoryProvider,
    W: Write,
{
    tracing::debug!("Running migrate command: {:?}", command);
    match command {
        MigrateCommand::Apply => apply(migrator, &options.cancel, out).await,
        MigrateCommand::History => history(migrator, out).await,
        MigrateCommand::NewList => new_list(migrator, out).await,
        MigrateCommand::Create { name, package, path } => {
            let config = options.config.as_ref();
            let package = package
                .as_deref()
                .or_else(|| config.map(|c| c.package.as_str()));
            let path = path
                .as_deref()
                .or_else(|| config.map(|c| c.migrations_dir.as_path()));
            create(name, package, path, out)
        }
        MigrateCommand::Down { count } => down(migrator, *count, &options.cancel, out).await,
    }
}

pub async fn apply<P: HistoryProvider, W: Write>(
    migrator: &Migrator<P>,
    cancel: &CancellationToken,
    out: &mut W,
) -> anyhow::Result<()> {
    match migrator.apply_until(cancel).await {
        Ok(result) => {
            if result.applied_migrations.is_empty() {
                writeln!(out, "There are no new migrations")?;
            } else {
                print_list(out, "List of applied migrations:", &result.applied_migrations)?;
            }
            Ok(())
        }
        Err(failure) => {
            if !failure.completed.is_empty() {
                print_list(out, "List of applied migrations:", &failure.completed)?;
            }
            Err(failure).context("Failed to apply migrations")
        }
    }
}

pub async fn history<P: HistoryProvider, W: Write>(migrator: &Migrator<P>, out: &mut W) -> anyhow::Result<()> {
    let applied = migrator.history().await.context("Failed to read migration history")?;
    if applied.is_empty() {
        writeln!(out, "History is empty")?;
        return Ok(());
    }

    for name in &applied {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

pub async fn new_list<P: HistoryProvider, W: Write>(migrator: &Migrator<P>, out: &mut W) -> anyhow::Result<()> {
    let pending = migrator.pending().await.context("Failed to resolve new migrations")?;
    if pending.is_empty() {
        writeln!(out, "There are no new migrations")?;
        return Ok(());
    }

    for name in &pending {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

pub fn create<W: Write>(name: &str, package: Option<&str>, path: Option<&Path>, out: &mut W) -> anyhow::Result<()> {
    let base_dir = resolve_base_dir(path)?;
    let package = package.unwrap_or(DEFAULT_PACKAGE);

    let file = create_migration_file(&base_dir, package, name)
        .with_context(|| format!("Failed to create migration '{}'", name))?;

    writeln!(out, "New migration file is here: {}", file.display())?;
    Ok(())
}

pub async fn down<P: HistoryProvider, W: Write>(
    migrator: &Migrator<P>,
    count: usize,
    cancel: &CancellationToken,
    out: &mut W,
) -> anyhow::Result<()> {
    match migrator.down_until(count, cancel).await {
        Ok(result) => {
            if result.rolled_back_migrations.is_empty() {
                writeln!(out, "There is nothing to down")?;
            } else {
                print_list(out, "List of downed migrations:", &result.rolled_back_migrations)?;
            }
            Ok(())
        }
        Err(failure) => {
            if !failure.completed.is_empty() {
                print_list(out, "List of downed migrations:", &failure.completed)?;
            }
            Err(failure).context("Failed to roll back migrations")
        }
    }
}

/// Relative paths are taken from the current directory
fn resolve_base_dir(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(match path {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => current_dir.join(path),
        None => current_dir,
    })
}

fn print_list<W: Write>(out: &mut W, header: &str, names: &[String]) -> std::io::Result<()> {
    writeln!(out, "{}", header)?;
    for name in names {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_is_kept() {
        let dir = std::env::temp_dir();
        assert_eq!(resolve_base_dir(Some(&dir)).unwrap(), dir);
    }

    #[test]
    fn test_print_list() {
        let mut out = Vec::new();
        print_list(&mut out, "Header:", &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Header:\na\nb\n");
    }
}
