//! Domain model: execution requests and their child records.

pub mod defect;
pub mod execution;

pub use self::defect::{Defect, DefectLink, Label, NewDefect};
pub use self::execution::{
    Attachment, ExecutionRequest, ExecutionRequestFilter, LogRecord, NewExecutionRequest,
    NewLogRecord, NewTestRun, StatusCounters, TestRun, ValidationStep, ValidationTable,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    NotStarted,
    InProgress,
    Finished,
    Stopped,
    Terminated,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::NotStarted => "NOT_STARTED",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Finished => "FINISHED",
            ExecutionStatus::Stopped => "STOPPED",
            ExecutionStatus::Terminated => "TERMINATED",
        }
    }

    /// Whether the request has stopped accepting test runs.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Finished | ExecutionStatus::Stopped | ExecutionStatus::Terminated
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(ExecutionStatus::NotStarted),
            "IN_PROGRESS" => Ok(ExecutionStatus::InProgress),
            "FINISHED" => Ok(ExecutionStatus::Finished),
            "STOPPED" => Ok(ExecutionStatus::Stopped),
            "TERMINATED" => Ok(ExecutionStatus::Terminated),
            other => anyhow::bail!("unknown execution status '{}'", other),
        }
    }
}

/// Outcome of a test run or a single log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestingStatus {
    Passed,
    Failed,
    Warning,
    Skipped,
    Blocked,
    Stopped,
    Unknown,
}

impl TestingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestingStatus::Passed => "PASSED",
            TestingStatus::Failed => "FAILED",
            TestingStatus::Warning => "WARNING",
            TestingStatus::Skipped => "SKIPPED",
            TestingStatus::Blocked => "BLOCKED",
            TestingStatus::Stopped => "STOPPED",
            TestingStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TestingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASSED" => Ok(TestingStatus::Passed),
            "FAILED" => Ok(TestingStatus::Failed),
            "WARNING" => Ok(TestingStatus::Warning),
            "SKIPPED" => Ok(TestingStatus::Skipped),
            "BLOCKED" => Ok(TestingStatus::Blocked),
            "STOPPED" => Ok(TestingStatus::Stopped),
            "UNKNOWN" => Ok(TestingStatus::Unknown),
            other => anyhow::bail!("unknown testing status '{}'", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_wire_format() {
        for status in [
            TestingStatus::Passed,
            TestingStatus::Failed,
            TestingStatus::Warning,
            TestingStatus::Skipped,
            TestingStatus::Blocked,
            TestingStatus::Stopped,
            TestingStatus::Unknown,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("DONE".parse::<ExecutionStatus>().is_err());
        assert!("passed".parse::<TestingStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ExecutionStatus::Finished.is_terminal());
        assert!(ExecutionStatus::Terminated.is_terminal());
        assert!(!ExecutionStatus::InProgress.is_terminal());
    }
}
