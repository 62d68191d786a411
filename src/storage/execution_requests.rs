//! Execution request persistence.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_parsed, get_ts, get_ts_opt, get_uuid, get_uuid_opt, labels, ts, ts_opt};
use crate::model::{ExecutionRequest, ExecutionRequestFilter, ExecutionStatus, StatusCounters};

const COLUMNS: &str = "id, name, status, project_id, test_plan_id, executor_name, environment,
    start_date, finish_date, duration_secs,
    passed_count, failed_count, warning_count, skipped_count, blocked_count, stopped_count,
    unknown_count, passed_rate, archived";

/// Insert a new execution request together with its labels.
pub fn insert(conn: &Connection, er: &ExecutionRequest) -> Result<()> {
    conn.execute(
        "INSERT INTO execution_requests
            (id, name, status, project_id, test_plan_id, executor_name, environment,
             start_date, finish_date, duration_secs, passed_rate, archived)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            er.id.to_string(),
            er.name,
            er.status.as_str(),
            er.project_id.map(|id| id.to_string()),
            er.test_plan_id.map(|id| id.to_string()),
            er.executor_name,
            er.environment,
            ts(&er.start_date),
            ts_opt(&er.finish_date),
            er.duration_secs,
            er.passed_rate,
            er.archived,
        ],
    )?;
    labels::attach_to_execution_request(conn, er.id, &er.labels)?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<ExecutionRequest>> {
    let sql = format!("SELECT {} FROM execution_requests WHERE id = ?1", COLUMNS);
    let found = conn
        .query_row(&sql, params![id.to_string()], from_row)
        .optional()?;

    match found {
        Some(mut er) => {
            er.labels = labels::for_execution_request(conn, er.id)?;
            Ok(Some(er))
        }
        None => Ok(None),
    }
}

/// List execution requests matching `filter`, newest first.
pub fn list(conn: &Connection, filter: &ExecutionRequestFilter) -> Result<Vec<ExecutionRequest>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(label) = &filter.label {
        clauses.push(
            "id IN (SELECT erl.execution_request_id FROM execution_request_labels erl
                    JOIN labels l ON l.id = erl.label_id WHERE l.name = ?)",
        );
        args.push(label.clone());
    }
    if let Some(environment) = &filter.environment {
        clauses.push("environment = ?");
        args.push(environment.clone());
    }
    if let Some(from) = &filter.from {
        clauses.push("start_date >= ?");
        args.push(ts(from));
    }
    if let Some(to) = &filter.to {
        clauses.push("start_date <= ?");
        args.push(ts(to));
    }

    let mut sql = format!("SELECT {} FROM execution_requests", COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY start_date DESC, rowid DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut requests = stmt
        .query_map(params_from_iter(args.iter()), from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for er in &mut requests {
        er.labels = labels::for_execution_request(conn, er.id)?;
    }
    Ok(requests)
}

pub fn update_counters(conn: &Connection, id: Uuid, counters: &StatusCounters) -> Result<()> {
    conn.execute(
        "UPDATE execution_requests SET
            passed_count = ?2, failed_count = ?3, warning_count = ?4, skipped_count = ?5,
            blocked_count = ?6, stopped_count = ?7, unknown_count = ?8, passed_rate = ?9
         WHERE id = ?1",
        params![
            id.to_string(),
            counters.passed,
            counters.failed,
            counters.warning,
            counters.skipped,
            counters.blocked,
            counters.stopped,
            counters.unknown,
            counters.passed_rate(),
        ],
    )?;
    Ok(())
}

pub fn finish(
    conn: &Connection,
    id: Uuid,
    status: ExecutionStatus,
    finish_date: DateTime<Utc>,
    duration_secs: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE execution_requests SET status = ?2, finish_date = ?3, duration_secs = ?4
         WHERE id = ?1",
        params![id.to_string(), status.as_str(), ts(&finish_date), duration_secs],
    )?;
    Ok(())
}

/// Archive terminal, not yet archived requests that finished before `cutoff`.
pub fn archive_finished_before(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE execution_requests SET archived = 1
         WHERE archived = 0
           AND finish_date IS NOT NULL
           AND finish_date < ?1
           AND status IN ('FINISHED', 'STOPPED', 'TERMINATED')",
        params![ts(&cutoff)],
    )?;
    Ok(changed)
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExecutionRequest> {
    let counters = StatusCounters {
        passed: row.get(10)?,
        failed: row.get(11)?,
        warning: row.get(12)?,
        skipped: row.get(13)?,
        blocked: row.get(14)?,
        stopped: row.get(15)?,
        unknown: row.get(16)?,
    };
    Ok(ExecutionRequest {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        status: get_parsed(row, 2)?,
        project_id: get_uuid_opt(row, 3)?,
        test_plan_id: get_uuid_opt(row, 4)?,
        executor_name: row.get(5)?,
        environment: row.get(6)?,
        start_date: get_ts(row, 7)?,
        finish_date: get_ts_opt(row, 8)?,
        duration_secs: row.get(9)?,
        counters,
        passed_rate: row.get(17)?,
        labels: Vec::new(),
        archived: row.get(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;
    use chrono::Duration;

    fn request(name: &str, start_date: DateTime<Utc>, labels: &[&str]) -> ExecutionRequest {
        ExecutionRequest {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: ExecutionStatus::InProgress,
            project_id: None,
            test_plan_id: None,
            executor_name: Some("jenkins".to_string()),
            environment: Some("staging".to_string()),
            start_date,
            finish_date: None,
            duration_secs: 0,
            counters: StatusCounters::default(),
            passed_rate: 0,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            archived: false,
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_get_roundtrip_labels_in_order() {
        let conn = setup();
        let er = request("nightly", Utc::now(), &["tier2", "api", "smoke"]);
        insert(&conn, &er).unwrap();

        let stored = get(&conn, er.id).unwrap().unwrap();
        assert_eq!(stored.name, "nightly");
        assert_eq!(stored.status, ExecutionStatus::InProgress);
        assert_eq!(stored.labels, vec!["tier2", "api", "smoke"]);
        assert!(get(&conn, Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_orders_newest_first() {
        let conn = setup();
        let now = Utc::now();
        let old = request("old", now - Duration::hours(2), &["smoke"]);
        let mid = request("mid", now - Duration::hours(1), &[]);
        let new = request("new", now, &["smoke"]);
        for er in [&old, &mid, &new] {
            insert(&conn, er).unwrap();
        }

        let all = list(&conn, &ExecutionRequestFilter::default()).unwrap();
        let names: Vec<_> = all.iter().map(|er| er.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);

        let smoke = list(
            &conn,
            &ExecutionRequestFilter {
                label: Some("smoke".to_string()),
                limit: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "new");
    }

    #[test]
    fn test_archive_only_touches_old_finished_requests() {
        let conn = setup();
        let now = Utc::now();
        let finished_old = request("finished-old", now - Duration::days(40), &[]);
        let finished_new = request("finished-new", now - Duration::days(1), &[]);
        let running = request("running", now - Duration::days(40), &[]);
        for er in [&finished_old, &finished_new, &running] {
            insert(&conn, er).unwrap();
        }
        finish(&conn, finished_old.id, ExecutionStatus::Finished, now - Duration::days(39), 60).unwrap();
        finish(&conn, finished_new.id, ExecutionStatus::Finished, now, 60).unwrap();

        let archived = archive_finished_before(&conn, now - Duration::days(30)).unwrap();
        assert_eq!(archived, 1);
        assert!(get(&conn, finished_old.id).unwrap().unwrap().archived);
        assert!(!get(&conn, finished_new.id).unwrap().unwrap().archived);
        assert!(!get(&conn, running.id).unwrap().unwrap().archived);
    }
}
