//! Connection setup and schema migrations.
//!
//! One SQLite file holds everything. Versioned migrations run on every
//! open; `schema_version` records what has been applied.

use std::path::Path;

use rusqlite::Connection;
use tracing;

use super::DatabaseError;

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // WAL + busy timeout: request handlers each open their own
    // connection to the same file.
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // clients, client_metadata, programs, program_metadata,
        // enrollments + schema_version = 6 total
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 6, "Expected 6 tables, got {count}");
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        // Run migrations again — should not error
        let result = run_migrations(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn enum_checks_enforced() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO clients (id, first_name, last_name, date_of_birth, gender, created_at, updated_at)
             VALUES ('x', 'A', 'B', '1990-01-01', 'robot', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_metadata_starts_with_zero_enrollment() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO programs (id, name, description, created_at, updated_at)
             VALUES ('p1', 'Cardiac Rehab', 'Twelve weeks', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO program_metadata (id, program_id, created_at, updated_at)
             VALUES ('m1', 'p1', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT current_enrollment FROM program_metadata WHERE program_id = 'p1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
