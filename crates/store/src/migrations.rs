//! Numbered SQL migrations.
//!
//! Files are named `NNN-description.sql` and run in ascending `NNN` order.
//! No record of applied migrations is kept: every call runs every file, so
//! the bundled files are written to be safe against an existing schema.

use std::sync::LazyLock;

use {
    include_dir::{Dir, include_dir},
    regex::Regex,
    sqlx::SqlitePool,
    tracing::info,
};

use crate::{Error, Result};

static BUNDLED: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

#[allow(clippy::unwrap_used)] // literal pattern
static MIGRATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{3})-.*\.sql$").unwrap());

/// A single migration file, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub number: u16,
    pub name: String,
    pub sql: String,
}

/// Order candidate `(file name, contents)` pairs into a migration plan.
///
/// Names that don't match `NNN-*.sql` are skipped. Two files sharing a
/// number are rejected rather than one silently shadowing the other.
pub fn plan(files: impl IntoIterator<Item = (String, String)>) -> Result<Vec<Migration>> {
    let mut plan: Vec<Migration> = Vec::new();

    for (name, sql) in files {
        let Some(caps) = MIGRATION_NAME.captures(&name) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u16>() else {
            continue;
        };
        if let Some(existing) = plan.iter().find(|m| m.number == number) {
            return Err(Error::DuplicateMigration {
                number,
                first: existing.name.clone(),
                second: name,
            });
        }
        plan.push(Migration { number, name, sql });
    }

    plan.sort_by_key(|m| m.number);
    Ok(plan)
}

/// The migrations shipped in this crate's `migrations/` directory.
pub fn bundled() -> Result<Vec<Migration>> {
    let files = BUNDLED.files().filter_map(|file| {
        let name = file.path().file_name()?.to_str()?.to_string();
        let sql = file.contents_utf8()?.to_string();
        Some((name, sql))
    });
    plan(files)
}

/// Execute `migrations` in order against `pool`, stopping at the first failure.
pub async fn apply(pool: &SqlitePool, migrations: &[Migration]) -> Result<()> {
    for migration in migrations {
        info!(name = %migration.name, "applying migration");
        let result = sqlx::raw_sql(&migration.sql)
            .execute(pool)
            .await
            .map_err(|source| Error::Migration {
                name: migration.name.clone(),
                source,
            })?;
        info!(
            name = %migration.name,
            rows_affected = result.rows_affected(),
            "migration applied"
        );
    }
    Ok(())
}

/// Apply the bundled migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    apply(pool, &bundled()?).await
}
