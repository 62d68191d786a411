use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExecutionStatus, TestingStatus};

/// Number of completed test runs per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounters {
    pub passed: u32,
    pub failed: u32,
    pub warning: u32,
    pub skipped: u32,
    pub blocked: u32,
    pub stopped: u32,
    pub unknown: u32,
}

impl StatusCounters {
    pub fn from_statuses<I: IntoIterator<Item = TestingStatus>>(statuses: I) -> Self {
        let mut counters = Self::default();
        for status in statuses {
            counters.record(status);
        }
        counters
    }

    pub fn record(&mut self, status: TestingStatus) {
        let slot = match status {
            TestingStatus::Passed => &mut self.passed,
            TestingStatus::Failed => &mut self.failed,
            TestingStatus::Warning => &mut self.warning,
            TestingStatus::Skipped => &mut self.skipped,
            TestingStatus::Blocked => &mut self.blocked,
            TestingStatus::Stopped => &mut self.stopped,
            TestingStatus::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.passed
            + self.failed
            + self.warning
            + self.skipped
            + self.blocked
            + self.stopped
            + self.unknown
    }

    /// Rounded share of passed runs, 0 when nothing completed.
    pub fn passed_rate(&self) -> i32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.passed * 100 + total / 2) / total) as i32
    }
}

/// Root aggregate for one test-automation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub id: Uuid,
    pub name: String,
    pub status: ExecutionStatus,
    pub project_id: Option<Uuid>,
    pub test_plan_id: Option<Uuid>,
    pub executor_name: Option<String>,
    pub environment: Option<String>,
    pub start_date: DateTime<Utc>,
    pub finish_date: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub counters: StatusCounters,
    pub passed_rate: i32,
    pub labels: Vec<String>,
    pub archived: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExecutionRequest {
    pub name: String,
    pub project_id: Option<Uuid>,
    pub test_plan_id: Option<Uuid>,
    pub executor_name: Option<String>,
    pub environment: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Listing filter for execution requests. Results are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionRequestFilter {
    pub label: Option<String>,
    pub environment: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// One test case's execution within an execution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: Uuid,
    pub execution_request_id: Uuid,
    pub name: String,
    pub test_case_id: Option<Uuid>,
    pub status: TestingStatus,
    pub start_date: DateTime<Utc>,
    pub finish_date: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub root_cause_id: Option<Uuid>,
    pub defect_found_in_id: Option<Uuid>,
    pub comment: Option<String>,
    pub labels: Vec<String>,
}

impl TestRun {
    pub fn is_completed(&self) -> bool {
        self.finish_date.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTestRun {
    pub name: String,
    pub test_case_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Expected/actual pairs captured by a validation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationTable {
    pub steps: Vec<ValidationStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStep {
    pub name: String,
    pub expected: String,
    pub actual: String,
    pub status: TestingStatus,
}

impl ValidationTable {
    /// Worst status across the steps: any failure fails the table.
    pub fn status(&self) -> TestingStatus {
        if self.steps.iter().any(|s| s.status == TestingStatus::Failed) {
            TestingStatus::Failed
        } else if self.steps.iter().any(|s| s.status == TestingStatus::Warning) {
            TestingStatus::Warning
        } else if self.steps.is_empty() {
            TestingStatus::Unknown
        } else {
            TestingStatus::Passed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    /// Path relative to the attachments root.
    pub path: String,
}

/// Step-level record within a test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub test_run_id: Uuid,
    pub parent_record_id: Option<Uuid>,
    pub name: String,
    pub message: String,
    pub status: TestingStatus,
    pub start_date: DateTime<Utc>,
    pub finish_date: Option<DateTime<Utc>>,
    pub validation_table: Option<ValidationTable>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLogRecord {
    pub name: String,
    #[serde(default)]
    pub message: String,
    pub parent_record_id: Option<Uuid>,
    /// Defaults to the validation table status, or UNKNOWN.
    pub status: Option<TestingStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub validation_table: Option<ValidationTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_rate_rounds_to_nearest() {
        let counters = StatusCounters::from_statuses([
            TestingStatus::Passed,
            TestingStatus::Passed,
            TestingStatus::Failed,
        ]);
        assert_eq!(counters.total(), 3);
        assert_eq!(counters.passed_rate(), 67);
    }

    #[test]
    fn test_passed_rate_without_runs_is_zero() {
        assert_eq!(StatusCounters::default().passed_rate(), 0);
    }

    #[test]
    fn test_validation_table_status() {
        let step = |status| ValidationStep {
            name: "balance".to_string(),
            expected: "100".to_string(),
            actual: "100".to_string(),
            status,
        };
        let table = ValidationTable {
            steps: vec![step(TestingStatus::Passed), step(TestingStatus::Warning)],
        };
        assert_eq!(table.status(), TestingStatus::Warning);

        let table = ValidationTable {
            steps: vec![step(TestingStatus::Failed), step(TestingStatus::Warning)],
        };
        assert_eq!(table.status(), TestingStatus::Failed);
        assert_eq!(ValidationTable::default().status(), TestingStatus::Unknown);
    }
}
