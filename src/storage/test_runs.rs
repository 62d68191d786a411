//! Test run persistence.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_parsed, get_ts, get_ts_opt, get_uuid, get_uuid_opt, labels, ts, ts_opt};
use crate::model::{TestRun, TestingStatus};

const COLUMNS: &str = "id, execution_request_id, name, test_case_id, status, start_date,
    finish_date, duration_secs, root_cause_id, defect_found_in_id, comment";

pub fn insert(conn: &Connection, run: &TestRun) -> Result<()> {
    conn.execute(
        "INSERT INTO test_runs
            (id, execution_request_id, name, test_case_id, status, start_date, finish_date,
             duration_secs, root_cause_id, defect_found_in_id, comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            run.id.to_string(),
            run.execution_request_id.to_string(),
            run.name,
            run.test_case_id.map(|id| id.to_string()),
            run.status.as_str(),
            ts(&run.start_date),
            ts_opt(&run.finish_date),
            run.duration_secs,
            run.root_cause_id.map(|id| id.to_string()),
            run.defect_found_in_id.map(|id| id.to_string()),
            run.comment,
        ],
    )?;
    labels::attach_to_test_run(conn, run.id, &run.labels)?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<TestRun>> {
    let sql = format!("SELECT {} FROM test_runs WHERE id = ?1", COLUMNS);
    let found = conn
        .query_row(&sql, params![id.to_string()], from_row)
        .optional()?;

    match found {
        Some(mut run) => {
            run.labels = labels::for_test_run(conn, run.id)?;
            Ok(Some(run))
        }
        None => Ok(None),
    }
}

/// Test runs of one execution request in start order.
pub fn for_execution_request(conn: &Connection, execution_request_id: Uuid) -> Result<Vec<TestRun>> {
    let sql = format!(
        "SELECT {} FROM test_runs WHERE execution_request_id = ?1 ORDER BY start_date, rowid",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut runs = stmt
        .query_map(params![execution_request_id.to_string()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for run in &mut runs {
        run.labels = labels::for_test_run(conn, run.id)?;
    }
    Ok(runs)
}

/// Statuses of the completed runs of one execution request.
pub fn completed_statuses(conn: &Connection, execution_request_id: Uuid) -> Result<Vec<TestingStatus>> {
    let mut stmt = conn.prepare(
        "SELECT status FROM test_runs WHERE execution_request_id = ?1 AND finish_date IS NOT NULL",
    )?;
    let statuses = stmt
        .query_map(params![execution_request_id.to_string()], |row| get_parsed(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(statuses)
}

/// Store the result of a finished run.
pub fn update_result(conn: &Connection, run: &TestRun) -> Result<()> {
    conn.execute(
        "UPDATE test_runs SET status = ?2, finish_date = ?3, duration_secs = ?4,
            root_cause_id = ?5, defect_found_in_id = ?6, comment = ?7
         WHERE id = ?1",
        params![
            run.id.to_string(),
            run.status.as_str(),
            ts_opt(&run.finish_date),
            run.duration_secs,
            run.root_cause_id.map(|id| id.to_string()),
            run.defect_found_in_id.map(|id| id.to_string()),
            run.comment,
        ],
    )?;
    Ok(())
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestRun> {
    Ok(TestRun {
        id: get_uuid(row, 0)?,
        execution_request_id: get_uuid(row, 1)?,
        name: row.get(2)?,
        test_case_id: get_uuid_opt(row, 3)?,
        status: get_parsed(row, 4)?,
        start_date: get_ts(row, 5)?,
        finish_date: get_ts_opt(row, 6)?,
        duration_secs: row.get(7)?,
        root_cause_id: get_uuid_opt(row, 8)?,
        defect_found_in_id: get_uuid_opt(row, 9)?,
        comment: row.get(10)?,
        labels: Vec::new(),
    })
}
