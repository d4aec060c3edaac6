//! Database migration runner
//!
//! Migration SQL is embedded at compile time and applied in order, each in
//! its own transaction, recording its version in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{Result, SqliteError};

/// Embedded migrations, oldest first
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "000",
        include_str!("../migrations/000_create_schema_migrations.sql"),
    ),
    (
        "001",
        include_str!("../migrations/001_create_records_table.sql"),
    ),
];

/// Apply all pending migrations to the database
///
/// # Errors
///
/// Fails if a migration cannot be applied, or if the database records a
/// migration this build does not know about (it was written by a newer
/// version).
pub fn migrate(conn: &Connection) -> Result<()> {
    for (version, sql) in MIGRATIONS {
        apply_migration(conn, version, sql)?;
    }

    let unknown = applied_versions(conn)?
        .into_iter()
        .find(|v| !MIGRATIONS.iter().any(|(known, _)| known == v));
    if let Some(version) = unknown {
        return Err(SqliteError::Migration(format!(
            "database has unknown migration {version}"
        )));
    }

    Ok(())
}

/// Apply a single migration if it hasn't been applied yet
fn apply_migration(conn: &Connection, version: &str, sql: &str) -> Result<()> {
    if is_migration_applied(conn, version)? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?, CURRENT_TIMESTAMP)",
        [version],
    )?;
    tx.commit()?;

    Ok(())
}

fn schema_table_exists(conn: &Connection) -> Result<bool> {
    Ok(conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='schema_migrations'")?
        .exists([])?)
}

/// Check if a migration has already been applied
fn is_migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    if !schema_table_exists(conn)? {
        return Ok(false);
    }

    Ok(conn
        .prepare("SELECT 1 FROM schema_migrations WHERE version = ?")?
        .exists([version])?)
}

/// Versions recorded in `schema_migrations`, in order
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    if !schema_table_exists(conn)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}
