//! Ledger schema and migrations.
//!
//! Each migration runs once inside a transaction and is recorded in
//! `schema_migrations`.

use rusqlite::Connection;

use crate::error::{CostcalcError, Result};

const LEDGER_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("../../migrations/001_cost_items.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("../../migrations/002_products.sql"),
    },
];

/// Latest schema version known to this build.
#[must_use]
pub fn latest_version() -> i32 {
    LEDGER_MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring the ledger schema up to date.
///
/// Returns the schema version after migrating.
///
/// # Errors
/// Returns an error if the migrations table cannot be created or read, or a
/// migration fails to apply.
pub fn run_migrations(conn: &mut Connection) -> Result<i32> {
    ensure_schema_migrations_table(conn)?;

    let mut current_version = schema_version(conn)?;
    for migration in LEDGER_MIGRATIONS {
        if migration.version > current_version {
            apply_migration(conn, migration)?;
            tracing::debug!(version = migration.version, "Applied ledger migration");
            current_version = migration.version;
        }
    }

    Ok(current_version)
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    sql: &'static str,
}

fn db_error(context: &str, e: &rusqlite::Error) -> CostcalcError {
    CostcalcError::Other(anyhow::anyhow!("{context}: {e}"))
}

fn ensure_schema_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
            version INTEGER PRIMARY KEY,\
            applied_at TEXT DEFAULT (datetime('now'))\
        );",
    )
    .map_err(|e| db_error("create schema_migrations", &e))
}

fn schema_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .map_err(|e| db_error("read schema version", &e))?;

    Ok(version.unwrap_or(0))
}

fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let context = |step: &str| format!("{step} migration {}", migration.version);

    let tx = conn
        .transaction()
        .map_err(|e| db_error(&context("begin"), &e))?;
    tx.execute_batch(migration.sql)
        .map_err(|e| db_error(&context("apply"), &e))?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [migration.version],
    )
    .map_err(|e| db_error(&context("record"), &e))?;
    tx.commit().map_err(|e| db_error(&context("commit"), &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in_memory() -> Connection {
        Connection::open_in_memory().expect("open in-memory db")
    }

    fn table_count(conn: &Connection, name: &str) -> i32 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )
        .expect("query table existence")
    }

    #[test]
    fn migrations_create_schema() {
        let mut conn = open_in_memory();
        let version = run_migrations(&mut conn).expect("run migrations");
        assert_eq!(version, latest_version());
        assert_eq!(version, 2);

        for table in ["cost_items", "cost_item_logs", "products", "cost_allocations"] {
            assert_eq!(table_count(&conn, table), 1, "missing table {table}");
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = open_in_memory();
        let first = run_migrations(&mut conn).expect("first run");
        let second = run_migrations(&mut conn).expect("second run");
        assert_eq!(first, second);

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .expect("count migrations");
        assert_eq!(count, 2);
    }
}
