//! Per-user UI settings keyed by a fixed set of setting types.

use std::fmt;
use std::str::FromStr;

use crate::error::{RamError, RamResult};
use crate::storage::{self, Pool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSettingType {
    ExecutionRequestsColumns,
    TestRunsColumns,
    ReportWidgets,
}

impl UserSettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserSettingType::ExecutionRequestsColumns => "execution-requests-columns",
            UserSettingType::TestRunsColumns => "test-runs-columns",
            UserSettingType::ReportWidgets => "report-widgets",
        }
    }
}

impl fmt::Display for UserSettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserSettingType {
    type Err = RamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execution-requests-columns" => Ok(UserSettingType::ExecutionRequestsColumns),
            "test-runs-columns" => Ok(UserSettingType::TestRunsColumns),
            "report-widgets" => Ok(UserSettingType::ReportWidgets),
            other => Err(RamError::UnknownUserSettingType(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct SettingsService {
    pool: Pool,
}

impl SettingsService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn get(&self, user_id: &str, setting_type: &str) -> RamResult<Option<serde_json::Value>> {
        let setting_type: UserSettingType = setting_type.parse()?;
        let conn = self.pool.get()?;
        Ok(storage::settings::get(&conn, user_id, setting_type.as_str())?)
    }

    pub fn put(&self, user_id: &str, setting_type: &str, value: &serde_json::Value) -> RamResult<()> {
        let setting_type: UserSettingType = setting_type.parse()?;
        if user_id.trim().is_empty() {
            return Err(RamError::InvalidRequest("user id must not be empty".to_string()));
        }
        let conn = self.pool.get()?;
        storage::settings::upsert(&conn, user_id, setting_type.as_str(), value)?;
        tracing::debug!(%user_id, %setting_type, "user setting saved");
        Ok(())
    }
}
