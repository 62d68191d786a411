//! User-defined dictionary entries. Built-in entries are compiled in and never
//! stored here.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_uuid, ts};
use crate::dictionary::DictionaryEntry;

pub fn insert(conn: &Connection, entry: &DictionaryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO dictionary_entries (id, category, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![entry.id.to_string(), entry.category, entry.name, ts(&Utc::now())],
    )?;
    Ok(())
}

/// Entries whose stored category equals `category`, in insertion order.
pub fn find_by_category(conn: &Connection, category: &str) -> Result<Vec<DictionaryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, category, name FROM dictionary_entries WHERE category = ?1 ORDER BY rowid",
    )?;
    let entries = stmt
        .query_map(params![category], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<DictionaryEntry>> {
    let entry = conn
        .query_row(
            "SELECT id, category, name FROM dictionary_entries WHERE id = ?1",
            params![id.to_string()],
            from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn delete(conn: &Connection, id: Uuid) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM dictionary_entries WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(changed > 0)
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DictionaryEntry> {
    Ok(DictionaryEntry {
        id: get_uuid(row, 0)?,
        category: row.get(1)?,
        name: row.get(2)?,
        built_in: false,
    })
}
