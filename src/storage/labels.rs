//! Labels and their attachment to execution requests and test runs.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_ts, get_uuid, ts};
use crate::model::Label;

/// Get the label with `name`, creating it on first use.
pub fn ensure(conn: &Connection, name: &str) -> Result<Label> {
    conn.execute(
        "INSERT OR IGNORE INTO labels (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![Uuid::new_v4().to_string(), name, ts(&Utc::now())],
    )?;

    find(conn, name)?.ok_or_else(|| anyhow::anyhow!("label '{}' vanished after insert", name))
}

fn find(conn: &Connection, name: &str) -> Result<Option<Label>> {
    let label = conn
        .query_row(
            "SELECT id, name, created_at FROM labels WHERE name = ?1",
            params![name],
            label_from_row,
        )
        .optional()?;
    Ok(label)
}

pub fn list(conn: &Connection) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM labels ORDER BY name")?;
    let labels = stmt
        .query_map([], label_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels)
}

/// Attach labels in order. Already-attached labels keep their position.
pub fn attach_to_execution_request(conn: &Connection, id: Uuid, names: &[String]) -> Result<()> {
    for name in names {
        let label = ensure(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO execution_request_labels (execution_request_id, label_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1
                              FROM execution_request_labels WHERE execution_request_id = ?1))",
            params![id.to_string(), label.id.to_string()],
        )?;
    }
    Ok(())
}

pub fn attach_to_test_run(conn: &Connection, id: Uuid, names: &[String]) -> Result<()> {
    for name in names {
        let label = ensure(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO test_run_labels (test_run_id, label_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1
                              FROM test_run_labels WHERE test_run_id = ?1))",
            params![id.to_string(), label.id.to_string()],
        )?;
    }
    Ok(())
}

pub fn for_execution_request(conn: &Connection, id: Uuid) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT l.name FROM execution_request_labels erl
         JOIN labels l ON l.id = erl.label_id
         WHERE erl.execution_request_id = ?1
         ORDER BY erl.position",
    )?;
    let names = stmt
        .query_map(params![id.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

pub fn for_test_run(conn: &Connection, id: Uuid) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT l.name FROM test_run_labels trl
         JOIN labels l ON l.id = trl.label_id
         WHERE trl.test_run_id = ?1
         ORDER BY trl.position",
    )?;
    let names = stmt
        .query_map(params![id.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn label_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        created_at: get_ts(row, 2)?,
    })
}
