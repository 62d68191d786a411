//! Defect persistence and links to execution requests and test runs.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_ts, get_uuid, ts};
use crate::model::{Defect, DefectLink};

const KIND_EXECUTION_REQUEST: &str = "execution_request";
const KIND_TEST_RUN: &str = "test_run";

pub fn insert(conn: &Connection, defect: &Defect) -> Result<()> {
    conn.execute(
        "INSERT INTO defects (id, name, link, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            defect.id.to_string(),
            defect.name,
            defect.link,
            defect.description,
            ts(&defect.created_at),
        ],
    )?;
    for id in &defect.execution_request_ids {
        add_link(conn, defect.id, DefectLink::ExecutionRequest(*id))?;
    }
    for id in &defect.test_run_ids {
        add_link(conn, defect.id, DefectLink::TestRun(*id))?;
    }
    Ok(())
}

pub fn add_link(conn: &Connection, defect_id: Uuid, link: DefectLink) -> Result<()> {
    let (kind, target) = match link {
        DefectLink::ExecutionRequest(id) => (KIND_EXECUTION_REQUEST, id),
        DefectLink::TestRun(id) => (KIND_TEST_RUN, id),
    };
    conn.execute(
        "INSERT OR IGNORE INTO defect_links (defect_id, kind, target_id) VALUES (?1, ?2, ?3)",
        params![defect_id.to_string(), kind, target.to_string()],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Defect>> {
    let found = conn
        .query_row(
            "SELECT id, name, link, description, created_at FROM defects WHERE id = ?1",
            params![id.to_string()],
            from_row,
        )
        .optional()?;

    match found {
        Some(mut defect) => {
            load_links(conn, &mut defect)?;
            Ok(Some(defect))
        }
        None => Ok(None),
    }
}

/// All defects, or only those linked to `execution_request_id` directly or
/// through one of its test runs.
pub fn list(conn: &Connection, execution_request_id: Option<Uuid>) -> Result<Vec<Defect>> {
    let mut defects = match execution_request_id {
        Some(er_id) => {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT d.id, d.name, d.link, d.description, d.created_at
                 FROM defects d
                 JOIN defect_links dl ON dl.defect_id = d.id
                 WHERE (dl.kind = 'execution_request' AND dl.target_id = ?1)
                    OR (dl.kind = 'test_run' AND dl.target_id IN
                        (SELECT id FROM test_runs WHERE execution_request_id = ?1))
                 ORDER BY d.created_at",
            )?;
            let rows = stmt
                .query_map(params![er_id.to_string()], from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, name, link, description, created_at FROM defects ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    for defect in &mut defects {
        load_links(conn, defect)?;
    }
    Ok(defects)
}

fn load_links(conn: &Connection, defect: &mut Defect) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT kind, target_id FROM defect_links WHERE defect_id = ?1 ORDER BY rowid",
    )?;
    let links = stmt
        .query_map(params![defect.id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, get_uuid(row, 1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    defect.execution_request_ids.clear();
    defect.test_run_ids.clear();
    for (kind, target) in links {
        match kind.as_str() {
            KIND_EXECUTION_REQUEST => defect.execution_request_ids.push(target),
            KIND_TEST_RUN => defect.test_run_ids.push(target),
            other => tracing::warn!(defect_id = %defect.id, kind = %other, "unknown defect link kind"),
        }
    }
    Ok(())
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Defect> {
    Ok(Defect {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        link: row.get(2)?,
        description: row.get(3)?,
        created_at: get_ts(row, 4)?,
        execution_request_ids: Vec::new(),
        test_run_ids: Vec::new(),
    })
}
