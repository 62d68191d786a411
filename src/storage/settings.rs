//! Per-user settings stored as JSON values.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{get_json, ts};

pub fn get(conn: &Connection, user_id: &str, setting_type: &str) -> Result<Option<serde_json::Value>> {
    let value = conn
        .query_row(
            "SELECT value_json FROM user_settings WHERE user_id = ?1 AND setting_type = ?2",
            params![user_id, setting_type],
            |row| get_json(row, 0),
        )
        .optional()?;
    Ok(value)
}

pub fn upsert(
    conn: &Connection,
    user_id: &str,
    setting_type: &str,
    value: &serde_json::Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_settings (user_id, setting_type, value_json, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, setting_type)
         DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        params![user_id, setting_type, serde_json::to_string(value)?, ts(&Utc::now())],
    )?;
    Ok(())
}
