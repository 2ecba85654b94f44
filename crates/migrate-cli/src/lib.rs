//! Command line surface for elif-migrate
//!
//! Migrations are compiled into the host application, so this crate ships no
//! binary of its own. Mount [`MigrateCommand`] as a subcommand of the host CLI
//! (or parse [`MigrateCli`] directly) and hand it to [`run`] together with a
//! [`Migrator`](elif_migrate::Migrator) that has the application's migrations
//! registered:
//!
//! ```rust,ignore
//! let cli = MigrateCli::parse();
//! cli.init_tracing()?;
//!
//! let config = MigrateConfig::load(Path::new("migrate.yaml"))?;
//! let mut migrator = Migrator::from_config(SqliteProvider::from_config(&config).await?, &config);
//! migrations::register_all(migrator.registry_mut())?;
//!
//! // Ctrl-C lets the running migration finish, then stops
//! let cancel = CancellationToken::new();
//! let trigger = cancel.clone();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     trigger.cancel();
//! });
//!
//! let options = RunOptions::default().with_config(config).with_cancel(cancel);
//! run_with(&migrator, &cli.command, &options, &mut std::io::stdout()).await?;
//! ```

pub mod commands;
pub mod logging;

use clap::Parser;

pub use commands::migrate::{run, run_with, RunOptions};
pub use commands::MigrateCommand;
pub use logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Database migration management")]
pub struct MigrateCli {
    /// Log engine progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: MigrateCommand,
}

impl MigrateCli {
    pub fn logging_config(&self) -> LoggingConfig {
        let config = if self.verbose {
            LoggingConfig::verbose()
        } else {
            LoggingConfig::default()
        };
        config.with_json(self.json_logs)
    }

    /// Install a tracing subscriber honouring `--verbose` and `--json-logs`
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        init_logging(self.logging_config()).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_commands() {
        let cli = MigrateCli::try_parse_from(["migrate", "apply"]).unwrap();
        assert_eq!(cli.command, MigrateCommand::Apply);
        assert!(!cli.verbose);

        let cli = MigrateCli::try_parse_from(["migrate", "new-list", "-v"]).unwrap();
        assert_eq!(cli.command, MigrateCommand::NewList);
        assert!(cli.verbose);

        let cli = MigrateCli::try_parse_from(["migrate", "down", "2"]).unwrap();
        assert_eq!(cli.command, MigrateCommand::Down { count: 2 });

        let cli = MigrateCli::try_parse_from([
            "migrate", "create", "add_users", "--package", "schema", "--path", "db",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            MigrateCommand::Create {
                name: "add_users".to_string(),
                package: Some("schema".to_string()),
                path: Some(PathBuf::from("db")),
            }
        );
    }

    #[test]
    fn test_down_requires_count() {
        assert!(MigrateCli::try_parse_from(["migrate", "down"]).is_err());
        assert!(MigrateCli::try_parse_from(["migrate", "down", "-1"]).is_err());
    }

    #[test]
    fn test_logging_config_from_flags() {
        let cli = MigrateCli::try_parse_from(["migrate", "--verbose", "--json-logs", "history"]).unwrap();
        let config = cli.logging_config();
        assert_eq!(config.level, "info");
        assert!(config.json_format);
        assert_eq!(config.filter_directives(), "info,elif_migrate=debug,sqlx=warn");

        let cli = MigrateCli::try_parse_from(["migrate", "history"]).unwrap();
        assert_eq!(cli.logging_config().filter_directives(), "warn");
    }
}
