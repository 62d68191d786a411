//! Log record persistence. Validation tables and attachment lists are kept as
//! JSON columns on the record row.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_json, get_parsed, get_ts, get_ts_opt, get_uuid, get_uuid_opt, ts, ts_opt};
use crate::model::{Attachment, LogRecord, ValidationTable};

const COLUMNS: &str = "id, test_run_id, parent_record_id, name, message, status, start_date,
    finish_date, validation_json, attachments_json";

pub fn insert(conn: &Connection, record: &LogRecord) -> Result<()> {
    let validation_json = record
        .validation_table
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let attachments_json = serde_json::to_string(&record.attachments)?;

    conn.execute(
        "INSERT INTO log_records
            (id, test_run_id, parent_record_id, name, message, status, start_date, finish_date,
             validation_json, attachments_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id.to_string(),
            record.test_run_id.to_string(),
            record.parent_record_id.map(|id| id.to_string()),
            record.name,
            record.message,
            record.status.as_str(),
            ts(&record.start_date),
            ts_opt(&record.finish_date),
            validation_json,
            attachments_json,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<LogRecord>> {
    let sql = format!("SELECT {} FROM log_records WHERE id = ?1", COLUMNS);
    let record = conn
        .query_row(&sql, params![id.to_string()], from_row)
        .optional()?;
    Ok(record)
}

pub fn for_test_run(conn: &Connection, test_run_id: Uuid) -> Result<Vec<LogRecord>> {
    let sql = format!(
        "SELECT {} FROM log_records WHERE test_run_id = ?1 ORDER BY start_date, rowid",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![test_run_id.to_string()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn set_attachments(conn: &Connection, id: Uuid, attachments: &[Attachment]) -> Result<()> {
    conn.execute(
        "UPDATE log_records SET attachments_json = ?2 WHERE id = ?1",
        params![id.to_string(), serde_json::to_string(attachments)?],
    )?;
    Ok(())
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    let validation_table: Option<ValidationTable> = match row.get::<_, Option<String>>(8)? {
        Some(_) => Some(get_json(row, 8)?),
        None => None,
    };

    Ok(LogRecord {
        id: get_uuid(row, 0)?,
        test_run_id: get_uuid(row, 1)?,
        parent_record_id: get_uuid_opt(row, 2)?,
        name: row.get(3)?,
        message: row.get(4)?,
        status: get_parsed(row, 5)?,
        start_date: get_ts(row, 6)?,
        finish_date: get_ts_opt(row, 7)?,
        validation_table,
        attachments: get_json(row, 9)?,
    })
}
