//! Execution request lifecycle: creation, test run completion, finishing and
//! archiving.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::dictionary::{builtin, DictionaryCategory};
use crate::error::{RamError, RamResult};
use crate::model::{
    Attachment, ExecutionRequest, ExecutionRequestFilter, ExecutionStatus, Label, LogRecord,
    NewExecutionRequest, NewLogRecord, NewTestRun, StatusCounters, TestRun, TestingStatus,
};
use crate::storage::{self, Pool};

/// Result reported when a test run completes.
#[derive(Debug, Clone, Deserialize)]
pub struct TestRunResult {
    pub status: TestingStatus,
    pub finish_date: Option<DateTime<Utc>>,
    pub root_cause_id: Option<Uuid>,
    pub defect_found_in_id: Option<Uuid>,
    pub comment: Option<String>,
}

/// Request to close an execution request.
#[derive(Debug, Clone, Deserialize)]
pub struct FinishRequest {
    #[serde(default = "default_finish_status")]
    pub status: ExecutionStatus,
    pub finish_date: Option<DateTime<Utc>>,
}

fn default_finish_status() -> ExecutionStatus {
    ExecutionStatus::Finished
}

impl Default for FinishRequest {
    fn default() -> Self {
        Self {
            status: default_finish_status(),
            finish_date: None,
        }
    }
}

#[derive(Clone)]
pub struct ExecutionService {
    pool: Pool,
}

impl ExecutionService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn create(&self, new: NewExecutionRequest) -> RamResult<ExecutionRequest> {
        if new.name.trim().is_empty() {
            return Err(RamError::InvalidRequest(
                "execution request name must not be empty".to_string(),
            ));
        }

        let er = ExecutionRequest {
            id: Uuid::new_v4(),
            name: new.name,
            status: ExecutionStatus::InProgress,
            project_id: new.project_id,
            test_plan_id: new.test_plan_id,
            executor_name: new.executor_name,
            environment: new.environment,
            start_date: new.start_date.unwrap_or_else(Utc::now),
            finish_date: None,
            duration_secs: 0,
            counters: StatusCounters::default(),
            passed_rate: 0,
            labels: crate::lists::merge_lists(&new.labels, &[]),
            archived: false,
        };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        storage::execution_requests::insert(&tx, &er)?;
        tx.commit()?;

        tracing::info!(id = %er.id, name = %er.name, "execution request created");
        Ok(er)
    }

    pub fn get(&self, id: Uuid) -> RamResult<ExecutionRequest> {
        let conn = self.pool.get()?;
        load_request(&conn, id)
    }

    pub fn list(&self, filter: &ExecutionRequestFilter) -> RamResult<Vec<ExecutionRequest>> {
        let conn = self.pool.get()?;
        Ok(storage::execution_requests::list(&conn, filter)?)
    }

    /// All known labels, alphabetical.
    pub fn labels(&self) -> RamResult<Vec<Label>> {
        let conn = self.pool.get()?;
        Ok(storage::labels::list(&conn)?)
    }

    pub fn attach_labels(&self, id: Uuid, names: &[String]) -> RamResult<ExecutionRequest> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(RamError::InvalidRequest("no label names given".to_string()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        load_mutable(&tx, id)?;
        storage::labels::attach_to_execution_request(&tx, id, &names)?;
        let er = load_request(&tx, id)?;
        tx.commit()?;
        Ok(er)
    }

    /// Close the request with a terminal status.
    pub fn finish(&self, id: Uuid, request: FinishRequest) -> RamResult<ExecutionRequest> {
        if !request.status.is_terminal() {
            return Err(RamError::InvalidRequest(format!(
                "status {} does not finish an execution request",
                request.status
            )));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let er = load_mutable(&tx, id)?;
        if er.status.is_terminal() {
            return Err(RamError::InvalidRequest(format!(
                "execution request '{}' is already {}",
                er.id, er.status
            )));
        }
        let finish_date = request.finish_date.unwrap_or_else(Utc::now);
        let duration = (finish_date - er.start_date).num_seconds().max(0);
        storage::execution_requests::finish(&tx, id, request.status, finish_date, duration)?;
        let er = load_request(&tx, id)?;
        tx.commit()?;

        tracing::info!(
            id = %er.id,
            status = %er.status,
            passed_rate = er.passed_rate,
            duration_secs = er.duration_secs,
            "execution request finished"
        );
        Ok(er)
    }

    pub fn add_test_run(&self, execution_request_id: Uuid, new: NewTestRun) -> RamResult<TestRun> {
        if new.name.trim().is_empty() {
            return Err(RamError::InvalidRequest("test run name must not be empty".to_string()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let er = load_mutable(&tx, execution_request_id)?;
        if er.status.is_terminal() {
            return Err(RamError::InvalidRequest(format!(
                "execution request '{}' is already {}",
                er.id, er.status
            )));
        }

        let run = TestRun {
            id: Uuid::new_v4(),
            execution_request_id,
            name: new.name,
            test_case_id: new.test_case_id,
            status: TestingStatus::Unknown,
            start_date: new.start_date.unwrap_or_else(Utc::now),
            finish_date: None,
            duration_secs: 0,
            root_cause_id: None,
            defect_found_in_id: None,
            comment: None,
            labels: crate::lists::merge_lists(&new.labels, &[]),
        };
        storage::test_runs::insert(&tx, &run)?;
        tx.commit()?;

        tracing::debug!(id = %run.id, %execution_request_id, name = %run.name, "test run added");
        Ok(run)
    }

    pub fn get_test_run(&self, id: Uuid) -> RamResult<TestRun> {
        let conn = self.pool.get()?;
        storage::test_runs::get(&conn, id)?.ok_or(RamError::TestRunNotFound(id))
    }

    pub fn test_runs(&self, execution_request_id: Uuid) -> RamResult<Vec<TestRun>> {
        let conn = self.pool.get()?;
        load_request(&conn, execution_request_id)?;
        Ok(storage::test_runs::for_execution_request(&conn, execution_request_id)?)
    }

    /// Store a test run result and recompute the parent's counters.
    pub fn complete_test_run(&self, id: Uuid, result: TestRunResult) -> RamResult<TestRun> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let mut run = storage::test_runs::get(&tx, id)?.ok_or(RamError::TestRunNotFound(id))?;
        load_mutable(&tx, run.execution_request_id)?;

        if let Some(root_cause) = result.root_cause_id {
            ensure_dictionary_entry(&tx, root_cause, DictionaryCategory::RootCause)?;
        }
        if let Some(found_in) = result.defect_found_in_id {
            ensure_dictionary_entry(&tx, found_in, DictionaryCategory::DefectFoundIn)?;
        }

        let finish_date = result.finish_date.unwrap_or_else(Utc::now);
        run.status = result.status;
        run.finish_date = Some(finish_date);
        run.duration_secs = (finish_date - run.start_date).num_seconds().max(0);
        run.root_cause_id = result.root_cause_id;
        run.defect_found_in_id = result.defect_found_in_id;
        run.comment = result.comment;
        storage::test_runs::update_result(&tx, &run)?;

        let statuses = storage::test_runs::completed_statuses(&tx, run.execution_request_id)?;
        let counters = StatusCounters::from_statuses(statuses);
        storage::execution_requests::update_counters(&tx, run.execution_request_id, &counters)?;
        tx.commit()?;

        tracing::debug!(
            id = %run.id,
            execution_request_id = %run.execution_request_id,
            status = %run.status,
            passed_rate = counters.passed_rate(),
            "test run completed"
        );
        Ok(run)
    }

    pub fn add_log_record(&self, test_run_id: Uuid, new: NewLogRecord) -> RamResult<LogRecord> {
        if new.name.trim().is_empty() {
            return Err(RamError::InvalidRequest("log record name must not be empty".to_string()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let run = storage::test_runs::get(&tx, test_run_id)?
            .ok_or(RamError::TestRunNotFound(test_run_id))?;
        load_mutable(&tx, run.execution_request_id)?;

        if let Some(parent) = new.parent_record_id {
            let parent_record = storage::log_records::get(&tx, parent)?
                .ok_or(RamError::LogRecordNotFound(parent))?;
            if parent_record.test_run_id != test_run_id {
                return Err(RamError::InvalidRequest(format!(
                    "parent log record '{}' belongs to another test run",
                    parent
                )));
            }
        }

        let status = new.status.unwrap_or_else(|| {
            new.validation_table
                .as_ref()
                .map(|t| t.status())
                .unwrap_or(TestingStatus::Unknown)
        });
        let record = LogRecord {
            id: Uuid::new_v4(),
            test_run_id,
            parent_record_id: new.parent_record_id,
            name: new.name,
            message: new.message,
            status,
            start_date: new.start_date.unwrap_or_else(Utc::now),
            finish_date: new.finish_date,
            validation_table: new.validation_table,
            attachments: Vec::new(),
        };
        storage::log_records::insert(&tx, &record)?;
        tx.commit()?;
        Ok(record)
    }

    pub fn get_log_record(&self, id: Uuid) -> RamResult<LogRecord> {
        let conn = self.pool.get()?;
        storage::log_records::get(&conn, id)?.ok_or(RamError::LogRecordNotFound(id))
    }

    pub fn log_records(&self, test_run_id: Uuid) -> RamResult<Vec<LogRecord>> {
        let conn = self.pool.get()?;
        if storage::test_runs::get(&conn, test_run_id)?.is_none() {
            return Err(RamError::TestRunNotFound(test_run_id));
        }
        Ok(storage::log_records::for_test_run(&conn, test_run_id)?)
    }

    /// Log record that may still receive attachments: it exists and its
    /// execution request is not archived.
    pub fn attachment_target(&self, log_record_id: Uuid) -> RamResult<LogRecord> {
        let conn = self.pool.get()?;
        let record = storage::log_records::get(&conn, log_record_id)?
            .ok_or(RamError::LogRecordNotFound(log_record_id))?;
        let run = storage::test_runs::get(&conn, record.test_run_id)?
            .ok_or(RamError::TestRunNotFound(record.test_run_id))?;
        load_mutable(&conn, run.execution_request_id)?;
        Ok(record)
    }

    /// Register an uploaded file on a log record, replacing any attachment
    /// with the same name.
    pub fn record_attachment(&self, log_record_id: Uuid, attachment: Attachment) -> RamResult<LogRecord> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut record = storage::log_records::get(&tx, log_record_id)?
            .ok_or(RamError::LogRecordNotFound(log_record_id))?;
        let run = storage::test_runs::get(&tx, record.test_run_id)?
            .ok_or(RamError::TestRunNotFound(record.test_run_id))?;
        load_mutable(&tx, run.execution_request_id)?;

        record.attachments.retain(|a| a.name != attachment.name);
        record.attachments.push(attachment);
        storage::log_records::set_attachments(&tx, log_record_id, &record.attachments)?;
        tx.commit()?;
        Ok(record)
    }

    /// Archive finished requests older than `cutoff`; returns how many.
    pub fn archive_older_than(&self, cutoff: DateTime<Utc>) -> RamResult<usize> {
        let conn = self.pool.get()?;
        let archived = storage::execution_requests::archive_finished_before(&conn, cutoff)?;
        if archived > 0 {
            tracing::info!(archived, %cutoff, "execution requests archived");
        }
        Ok(archived)
    }
}

fn load_request(conn: &Connection, id: Uuid) -> RamResult<ExecutionRequest> {
    storage::execution_requests::get(conn, id)?.ok_or(RamError::ExecutionRequestNotFound(id))
}

/// Load a request that is about to change; archived requests are frozen.
pub(crate) fn load_mutable(conn: &Connection, id: Uuid) -> RamResult<ExecutionRequest> {
    let er = load_request(conn, id)?;
    if er.archived {
        return Err(RamError::ExecutionRequestArchived(id));
    }
    Ok(er)
}

fn ensure_dictionary_entry(conn: &Connection, id: Uuid, category: DictionaryCategory) -> RamResult<()> {
    let stored_category = match builtin::find(id) {
        Some(entry) => Some(entry.category.name().to_string()),
        None => storage::dictionary::get(conn, id)?.map(|e| e.category),
    };
    match stored_category {
        Some(found) if found == category.name() => Ok(()),
        _ => Err(RamError::InvalidRequest(format!(
            "'{}' is not a '{}' dictionary entry",
            id, category
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> ExecutionService {
        ExecutionService::new(storage::open_memory_pool().unwrap())
    }

    fn new_request(name: &str) -> NewExecutionRequest {
        NewExecutionRequest {
            name: name.to_string(),
            labels: vec!["smoke".to_string(), "smoke".to_string(), "api".to_string()],
            ..Default::default()
        }
    }

    fn new_run(name: &str) -> NewTestRun {
        NewTestRun {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn result(status: TestingStatus) -> TestRunResult {
        TestRunResult {
            status,
            finish_date: None,
            root_cause_id: None,
            defect_found_in_id: None,
            comment: None,
        }
    }

    #[test]
    fn test_create_deduplicates_labels() {
        let svc = service();
        let er = svc.create(new_request("nightly")).unwrap();
        assert_eq!(er.status, ExecutionStatus::InProgress);
        assert_eq!(er.labels, vec!["smoke", "api"]);
        assert_eq!(svc.get(er.id).unwrap().labels, vec!["smoke", "api"]);
    }

    #[test]
    fn test_completing_runs_updates_counters() {
        let svc = service();
        let er = svc.create(new_request("nightly")).unwrap();
        let runs: Vec<TestRun> = ["login", "logout", "search", "checkout"]
            .iter()
            .map(|name| svc.add_test_run(er.id, new_run(name)).unwrap())
            .collect();

        svc.complete_test_run(runs[0].id, result(TestingStatus::Passed)).unwrap();
        svc.complete_test_run(runs[1].id, result(TestingStatus::Passed)).unwrap();
        svc.complete_test_run(runs[2].id, result(TestingStatus::Failed)).unwrap();

        let er = svc.get(er.id).unwrap();
        assert_eq!(er.counters.passed, 2);
        assert_eq!(er.counters.failed, 1);
        assert_eq!(er.counters.total(), 3);
        assert_eq!(er.passed_rate, 67);
    }

    #[test]
    fn test_finish_sets_duration_and_rejects_non_terminal() {
        let svc = service();
        let mut new = new_request("nightly");
        let start = Utc::now() - Duration::minutes(5);
        new.start_date = Some(start);
        let er = svc.create(new).unwrap();

        let err = svc
            .finish(
                er.id,
                FinishRequest {
                    status: ExecutionStatus::InProgress,
                    finish_date: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.reason(), "RAM-7000");

        let finished = svc
            .finish(
                er.id,
                FinishRequest {
                    status: ExecutionStatus::Finished,
                    finish_date: Some(start + Duration::seconds(300)),
                },
            )
            .unwrap();
        assert_eq!(finished.status, ExecutionStatus::Finished);
        assert_eq!(finished.duration_secs, 300);

        let err = svc.add_test_run(er.id, new_run("late")).unwrap_err();
        assert_eq!(err.reason(), "RAM-7000");
    }

    fn new_record(name: &str) -> NewLogRecord {
        NewLogRecord {
            name: name.to_string(),
            message: String::new(),
            parent_record_id: None,
            status: None,
            start_date: None,
            finish_date: None,
            validation_table: None,
        }
    }

    fn attachment(name: &str) -> Attachment {
        Attachment {
            name: name.to_string(),
            content_type: "text/plain".to_string(),
            path: format!("records/{}", name),
        }
    }

    #[test]
    fn test_finished_request_cannot_be_finished_again() {
        let svc = service();
        let er = svc.create(new_request("nightly")).unwrap();
        let finished = svc.finish(er.id, FinishRequest::default()).unwrap();

        let err = svc
            .finish(
                er.id,
                FinishRequest {
                    status: ExecutionStatus::Stopped,
                    finish_date: Some(Utc::now() + Duration::days(2)),
                },
            )
            .unwrap_err();
        assert_eq!(err.reason(), "RAM-7000");

        let unchanged = svc.get(er.id).unwrap();
        assert_eq!(unchanged.status, ExecutionStatus::Finished);
        assert_eq!(unchanged.finish_date, finished.finish_date);
        assert_eq!(unchanged.duration_secs, finished.duration_secs);
    }

    #[test]
    fn test_archived_request_is_immutable() {
        let svc = service();
        let er = svc.create(new_request("old")).unwrap();
        let run = svc.add_test_run(er.id, new_run("login")).unwrap();
        let record = svc.add_log_record(run.id, new_record("open page")).unwrap();
        svc.record_attachment(record.id, attachment("page.txt")).unwrap();
        svc.finish(
            er.id,
            FinishRequest {
                status: ExecutionStatus::Finished,
                finish_date: Some(Utc::now() - Duration::days(60)),
            },
        )
        .unwrap();

        assert_eq!(svc.archive_older_than(Utc::now() - Duration::days(30)).unwrap(), 1);

        let err = svc.complete_test_run(run.id, result(TestingStatus::Passed)).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");
        let err = svc.attach_labels(er.id, &["late".to_string()]).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");
        let err = svc.add_log_record(run.id, new_record("late step")).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");
        let err = svc.attachment_target(record.id).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");
        let err = svc.record_attachment(record.id, attachment("late.txt")).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");
        let err = svc.finish(er.id, FinishRequest::default()).unwrap_err();
        assert_eq!(err.reason(), "RAM-0004");

        let record = svc.get_log_record(record.id).unwrap();
        let names: Vec<_> = record.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["page.txt"]);
        assert_eq!(svc.log_records(run.id).unwrap().len(), 1);
    }

    #[test]
    fn test_root_cause_must_be_a_root_cause_entry() {
        let svc = service();
        let er = svc.create(new_request("nightly")).unwrap();
        let run = svc.add_test_run(er.id, new_run("login")).unwrap();

        let mut wrong = result(TestingStatus::Failed);
        wrong.root_cause_id = Some(builtin::DEFECT_FOUND_IN[0].id);
        let err = svc.complete_test_run(run.id, wrong).unwrap_err();
        assert_eq!(err.reason(), "RAM-7000");

        let mut right = result(TestingStatus::Failed);
        right.root_cause_id = Some(builtin::ROOT_CAUSE[1].id);
        right.defect_found_in_id = Some(builtin::DEFECT_FOUND_IN[2].id);
        let run = svc.complete_test_run(run.id, right).unwrap();
        assert_eq!(run.root_cause_id, Some(builtin::ROOT_CAUSE[1].id));
    }

    #[test]
    fn test_log_record_status_defaults_to_validation_table() {
        use crate::model::{ValidationStep, ValidationTable};

        let svc = service();
        let er = svc.create(new_request("nightly")).unwrap();
        let run = svc.add_test_run(er.id, new_run("transfer")).unwrap();

        let record = svc
            .add_log_record(
                run.id,
                NewLogRecord {
                    name: "check balance".to_string(),
                    message: String::new(),
                    parent_record_id: None,
                    status: None,
                    start_date: None,
                    finish_date: None,
                    validation_table: Some(ValidationTable {
                        steps: vec![ValidationStep {
                            name: "balance".to_string(),
                            expected: "100".to_string(),
                            actual: "90".to_string(),
                            status: TestingStatus::Failed,
                        }],
                    }),
                },
            )
            .unwrap();
        assert_eq!(record.status, TestingStatus::Failed);

        let records = svc.log_records(run.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].validation_table, record.validation_table);
    }

    #[test]
    fn test_missing_entities_map_to_not_found() {
        let svc = service();
        assert_eq!(svc.get(Uuid::new_v4()).unwrap_err().reason(), "RAM-0001");
        assert_eq!(svc.get_test_run(Uuid::new_v4()).unwrap_err().reason(), "RAM-0002");
        assert_eq!(svc.get_log_record(Uuid::new_v4()).unwrap_err().reason(), "RAM-0003");
    }
}
