use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag attached to execution requests and test runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Known product defect, linked to the runs that hit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defect {
    pub id: Uuid,
    pub name: String,
    /// Bug-tracker URL.
    pub link: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub execution_request_ids: Vec<Uuid>,
    pub test_run_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDefect {
    pub name: String,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DefectLink {
    ExecutionRequest(Uuid),
    TestRun(Uuid),
}
