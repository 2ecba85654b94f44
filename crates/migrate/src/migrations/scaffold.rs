//! Migration Scaffold - Generates new migration source files
//!
//! A generated migration is a Rust module with a `NAME` constant and a
//! `register` function whose actions are left empty. The name is prefixed with
//! a `YYYYMMDD-HHMMSS` UTC timestamp so that lexical order matches creation
//! order.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, MigrateResult};

/// Module used when no package is given
pub const DEFAULT_PACKAGE: &str = "migrations";

/// Format of the migration name prefix
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

static NAME_CONST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"pub const NAME: &str = "((?:[^"\\]|\\.)*)";"#).expect("name pattern is valid")
});

/// A generated migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    /// Module the file belongs to
    pub package: String,
    /// Fully qualified migration name, timestamp prefix included
    pub migration_name: String,
    /// File name without extension; a valid Rust module name
    pub file_stem: String,
    /// Rust source of the migration
    pub content: String,
}

/// Prefix `name` with the `YYYYMMDD-HHMMSS` timestamp of `now`
pub fn migration_name(name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.format(TIMESTAMP_FORMAT), name)
}

/// Generate a migration for `name` stamped with the current time
pub fn template(package: &str, name: &str) -> Scaffold {
    template_at(package, name, Utc::now())
}

/// Generate a migration for `name` stamped with `now`
pub fn template_at(package: &str, name: &str, now: DateTime<Utc>) -> Scaffold {
    let package = if package.trim().is_empty() {
        DEFAULT_PACKAGE.to_string()
    } else {
        package.trim().to_string()
    };

    let migration_name = migration_name(name, now);
    let file_stem = format!("m{}_{}", now.format("%Y%m%d_%H%M%S"), module_safe(name));
    let content = render(&package, &migration_name);

    Scaffold {
        package,
        migration_name,
        file_stem,
        content,
    }
}

/// Read the `NAME` constant back out of generated source
pub fn migration_name_from_source(content: &str) -> Option<String> {
    let captures = NAME_CONST.captures(content)?;
    unescape_literal(&captures[1])
}

/// Undo the escapes `{:?}` produces for a string literal
fn unescape_literal(literal: &str) -> Option<String> {
    let mut value = String::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }

        match chars.next()? {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            '0' => value.push('\0'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            '\'' => value.push('\''),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        digit => hex.push(digit),
                    }
                }
                value.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            _ => return None,
        }
    }

    Some(value)
}

/// Write a new migration into `<base_dir>/<package>/` and list it in `mod.rs`
///
/// Returns the path of the new file.
pub fn create_migration_file(base_dir: &Path, package: &str, name: &str) -> MigrateResult<PathBuf> {
    if name.trim().is_empty() {
        return Err(MigrateError::configuration("Migration name must not be empty"));
    }

    let scaffold = template(package, name);
    let dir = base_dir.join(&scaffold.package);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}.rs", scaffold.file_stem));
    if path.exists() {
        return Err(MigrateError::configuration(format!(
            "Migration file already exists: {}",
            path.display()
        )));
    }
    fs::write(&path, &scaffold.content)?;

    register_module(&dir.join("mod.rs"), &scaffold.file_stem)?;

    tracing::info!("Created migration {} at {}", scaffold.migration_name, path.display());
    Ok(path)
}

/// Append `pub mod <stem>;` to the package's `mod.rs`, creating it if needed
fn register_module(mod_file: &Path, stem: &str) -> MigrateResult<()> {
    let existing = if mod_file.exists() {
        fs::read_to_string(mod_file)?
    } else {
        String::new()
    };

    let declaration = format!("pub mod {};", stem);
    if existing.lines().any(|line| line.trim() == declaration) {
        return Ok(());
    }

    let mut file = OpenOptions::new().create(true).append(true).open(mod_file)?;
    if existing.is_empty() {
        writeln!(file, "//! Registered migrations\n")?;
    } else if !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{}", declaration)?;
    Ok(())
}

fn module_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn render(package: &str, migration_name: &str) -> String {
    format!(
        "//! Migration `{name}` for the `{package}` module.\n\
         \n\
         use elif_migrate::{{action, MigrateResult, MigrationRegistry}};\n\
         \n\
         pub const NAME: &str = {literal:?};\n\
         \n\
         pub fn register<H: Send + Sync + 'static>(registry: &mut MigrationRegistry<H>) -> MigrateResult<()> {{\n\
         \x20   registry.register(\n\
         \x20       NAME,\n\
         \x20       |_db| {{\n\
         \x20           action(async move {{\n\
         \x20               // TODO: write up logic\n\
         \x20               Ok(())\n\
         \x20           }})\n\
         \x20       }},\n\
         \x20       |_db| {{\n\
         \x20           action(async move {{\n\
         \x20               // TODO: write down logic\n\
         \x20               Ok(())\n\
         \x20           }})\n\
         \x20       }},\n\
         \x20   )\n\
         }}\n",
        name = migration_name.escape_debug(),
        package = package.escape_debug(),
        literal = migration_name,
    )
}
