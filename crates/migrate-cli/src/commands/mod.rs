pub mod migrate;

use clap::Subcommand;
use std::path::PathBuf;

/// Database migration management
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MigrateCommand {
    /// Run all new migrations
    Apply,

    /// Show applied migrations, newest first
    History,

    /// List migrations that have not been applied yet
    #[command(name = "new-list")]
    NewList,

    /// Create a new migration file
    Create {
        /// Migration name
        name: String,

        /// Module the migration is created in
        #[arg(long)]
        package: Option<String>,

        /// Directory that contains the package (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Roll back the most recent migrations (0 rolls back all of them)
    Down {
        /// Number of migrations to roll back
        count: usize,
    },
}
