//! Schema migrations
//!
//! The schema version is kept in SQLite's `user_version` pragma. Each
//! migration runs in its own transaction together with the version bump.

use crate::error::{Error, Result};
use rusqlite::Connection;

/// Schema version this build writes
pub const SCHEMA_VERSION: i32 = 2;

struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "focus and decision entries",
        sql: r#"
        CREATE TABLE focus_entries (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'PENDING',
            mood        TEXT NOT NULL DEFAULT '',
            notes       TEXT NOT NULL DEFAULT '',
            date        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE TABLE decision_entries (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL,
            reason      TEXT NOT NULL DEFAULT '',
            category    TEXT NOT NULL DEFAULT 'GENERAL',
            date        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX idx_focus_owner_date ON focus_entries(owner_id, date);
        CREATE INDEX idx_decision_owner_date ON decision_entries(owner_id, date);
        "#,
    },
    Migration {
        version: 2,
        description: "image urls",
        sql: r#"
        ALTER TABLE focus_entries ADD COLUMN image_url TEXT;
        ALTER TABLE decision_entries ADD COLUMN image_url TEXT;
        "#,
    },
];

/// Read `user_version` (0 for a fresh database).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Apply every migration newer than the database's version.
///
/// Fails if the database was written by a newer schema.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let found = get_schema_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(Error::Config(format!(
            "database schema v{} is newer than supported v{}",
            found, SCHEMA_VERSION
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        let batch = format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            migration.sql, migration.version
        );
        if let Err(e) = conn.execute_batch(&batch) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e.into());
        }
    }

    Ok(())
}
