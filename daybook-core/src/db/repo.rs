//! Database repository layer
//!
//! Provides owner-scoped query, insert, update and delete operations for
//! focus and decision entries. Every statement filters on `owner_id`.

use crate::error::{Error, Result};
use crate::store::{EntryFilter, EntryStore, SortOrder};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// Format a timestamp so that string order matches chronological order.
fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_ts(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    let idx = row.as_ref().column_index(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp {:?}: {}", raw, e)))
}

fn parse_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(column)?;
    let idx = row.as_ref().column_index(column)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

/// Append the WHERE clause for a filter, collecting its parameters.
fn push_filter(sql: &mut String, params: &mut Vec<Box<dyn rusqlite::ToSql>>, filter: &EntryFilter) {
    sql.push_str(" WHERE owner_id = ?");
    params.push(Box::new(filter.owner_id.clone()));

    if let Some(since) = &filter.since {
        sql.push_str(" AND date >= ?");
        params.push(Box::new(fmt_ts(since)));
    }

    if let Some(until) = &filter.until {
        sql.push_str(" AND date <= ?");
        params.push(Box::new(fmt_ts(until)));
    }

    if let Some(search) = &filter.search {
        sql.push_str(" AND instr(unicode_lower(title), ?) > 0");
        params.push(Box::new(search.to_lowercase()));
    }
}

/// Append ORDER BY / LIMIT / OFFSET for a filter.
fn push_paging(sql: &mut String, filter: &EntryFilter) {
    match filter.order {
        SortOrder::NewestFirst => sql.push_str(" ORDER BY date DESC, id"),
        SortOrder::OldestFirst => sql.push_str(" ORDER BY date ASC, id"),
    }

    match filter.limit {
        Some(limit) => sql.push_str(&format!(" LIMIT {}", limit)),
        None if filter.offset > 0 => sql.push_str(" LIMIT -1"),
        None => {}
    }

    if filter.offset > 0 {
        sql.push_str(&format!(" OFFSET {}", filter.offset));
    }
}

/// Register `unicode_lower(text)`. SQLite's built-in `lower()` only folds
/// ASCII, so "Élan" would not match a search for "élan".
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )?;
    Ok(())
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        register_functions(&conn)?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Focus entry operations
    // ============================================

    /// Insert a new focus entry
    pub fn insert_focus_entry(&self, entry: &FocusEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = fmt_ts(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO focus_entries (id, owner_id, title, status, mood, notes, date,
                                       image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                entry.id,
                entry.owner_id,
                entry.title,
                entry.status.as_str(),
                entry.mood,
                entry.notes,
                fmt_ts(&entry.date),
                entry.image_url,
                now,
            ],
        )?;
        tracing::debug!(id = %entry.id, owner = %entry.owner_id, "Inserted focus entry");
        Ok(())
    }

    /// Update the mutable fields of a focus entry.
    ///
    /// Returns `false` when no entry with this id belongs to the entry's owner.
    pub fn update_focus_entry(&self, entry: &FocusEntry) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"
            UPDATE focus_entries
            SET title = ?3, status = ?4, mood = ?5, notes = ?6, date = ?7,
                image_url = ?8, updated_at = ?9
            WHERE id = ?1 AND owner_id = ?2
            "#,
            params![
                entry.id,
                entry.owner_id,
                entry.title,
                entry.status.as_str(),
                entry.mood,
                entry.notes,
                fmt_ts(&entry.date),
                entry.image_url,
                fmt_ts(&Utc::now()),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Change only the status of a focus entry
    pub fn set_focus_status(&self, owner_id: &str, id: &str, status: FocusStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE focus_entries SET status = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, status.as_str(), fmt_ts(&Utc::now())],
        )?;
        if changed == 0 {
            return Err(Error::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Point a focus entry at an uploaded image
    pub fn set_focus_image(&self, owner_id: &str, id: &str, url: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE focus_entries SET image_url = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, url, fmt_ts(&Utc::now())],
        )?;
        if changed == 0 {
            tracing::warn!(id, owner = owner_id, "Image uploaded but focus entry is gone");
            return Err(Error::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Get a focus entry by ID
    pub fn get_focus_entry(&self, owner_id: &str, id: &str) -> Result<Option<FocusEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM focus_entries WHERE id = ?1 AND owner_id = ?2",
            [id, owner_id],
            Self::row_to_focus,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete a focus entry, returning whether it existed
    pub fn delete_focus_entry(&self, owner_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM focus_entries WHERE id = ?1 AND owner_id = ?2",
            [id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    /// Count focus entries matching a filter, ignoring its paging
    pub fn count_focus_entries(&self, filter: &EntryFilter) -> Result<i64> {
        self.count("focus_entries", filter)
    }

    fn row_to_focus(row: &Row) -> rusqlite::Result<FocusEntry> {
        Ok(FocusEntry {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            title: row.get("title")?,
            status: parse_column(row, "status")?,
            mood: row.get("mood")?,
            notes: row.get("notes")?,
            date: parse_ts(row, "date")?,
            image_url: row.get("image_url")?,
        })
    }

    // ============================================
    // Decision entry operations
    // ============================================

    /// Insert a new decision entry
    pub fn insert_decision_entry(&self, entry: &DecisionEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = fmt_ts(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO decision_entries (id, owner_id, title, reason, category, date,
                                          image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            params![
                entry.id,
                entry.owner_id,
                entry.title,
                entry.reason,
                entry.category.as_str(),
                fmt_ts(&entry.date),
                entry.image_url,
                now,
            ],
        )?;
        tracing::debug!(id = %entry.id, owner = %entry.owner_id, "Inserted decision entry");
        Ok(())
    }

    /// Update the mutable fields of a decision entry
    pub fn update_decision_entry(&self, entry: &DecisionEntry) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"
            UPDATE decision_entries
            SET title = ?3, reason = ?4, category = ?5, date = ?6, image_url = ?7,
                updated_at = ?8
            WHERE id = ?1 AND owner_id = ?2
            "#,
            params![
                entry.id,
                entry.owner_id,
                entry.title,
                entry.reason,
                entry.category.as_str(),
                fmt_ts(&entry.date),
                entry.image_url,
                fmt_ts(&Utc::now()),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Point a decision entry at an uploaded image
    pub fn set_decision_image(&self, owner_id: &str, id: &str, url: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE decision_entries SET image_url = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id, url, fmt_ts(&Utc::now())],
        )?;
        if changed == 0 {
            tracing::warn!(id, owner = owner_id, "Image uploaded but decision entry is gone");
            return Err(Error::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Get a decision entry by ID
    pub fn get_decision_entry(&self, owner_id: &str, id: &str) -> Result<Option<DecisionEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM decision_entries WHERE id = ?1 AND owner_id = ?2",
            [id, owner_id],
            Self::row_to_decision,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete a decision entry, returning whether it existed
    pub fn delete_decision_entry(&self, owner_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM decision_entries WHERE id = ?1 AND owner_id = ?2",
            [id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    /// Count decision entries matching a filter, ignoring its paging
    pub fn count_decision_entries(&self, filter: &EntryFilter) -> Result<i64> {
        self.count("decision_entries", filter)
    }

    fn row_to_decision(row: &Row) -> rusqlite::Result<DecisionEntry> {
        Ok(DecisionEntry {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            title: row.get("title")?,
            reason: row.get("reason")?,
            category: parse_column(row, "category")?,
            date: parse_ts(row, "date")?,
            image_url: row.get("image_url")?,
        })
    }

    // ============================================
    // Shared query helpers
    // ============================================

    fn count(&self, table: &str, filter: &EntryFilter) -> Result<i64> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT COUNT(*) FROM {}", table);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
        push_filter(&mut sql, &mut params, filter);

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count = conn.query_row(&sql, params_refs.as_slice(), |r| r.get(0))?;
        Ok(count)
    }

    fn list<T>(
        &self,
        table: &str,
        filter: &EntryFilter,
        map_row: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT * FROM {}", table);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
        push_filter(&mut sql, &mut params, filter);
        push_paging(&mut sql, filter);

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_refs.as_slice(), map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(table, owner = %filter.owner_id, rows = rows.len(), "Listed entries");
        Ok(rows)
    }
}

impl EntryStore for Database {
    fn list_focus_entries(&self, filter: &EntryFilter) -> Result<Vec<FocusEntry>> {
        self.list("focus_entries", filter, Self::row_to_focus)
    }

    fn list_decision_entries(&self, filter: &EntryFilter) -> Result<Vec<DecisionEntry>> {
        self.list("decision_entries", filter, Self::row_to_decision)
    }
}
