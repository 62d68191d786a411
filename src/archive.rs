//! Background archive sweep for finished execution requests.

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use tracing::{error, info};

use crate::config::ArchiveConfig;
use crate::service::ExecutionService;

pub struct ArchiveJob {
    schedule: Schedule,
    retention_days: u32,
    executions: ExecutionService,
}

impl ArchiveJob {
    pub fn new(config: &ArchiveConfig, executions: ExecutionService) -> Result<Self> {
        let schedule = Schedule::from_str(&config.cron)
            .map_err(|e| anyhow::anyhow!("Invalid archive cron expression '{}': {}", config.cron, e))?;
        Ok(Self {
            schedule,
            retention_days: config.retention_days,
            executions,
        })
    }

    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }

    /// Requests finished before this instant are archived.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.retention_days))
    }

    /// One sweep; returns how many requests were archived.
    pub fn run_once(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(self.executions.archive_older_than(self.cutoff(now))?)
    }
}

/// Sleep until each cron fire time and sweep. Returns only if the schedule
/// has no further fire times.
pub async fn run_archive_loop(job: ArchiveJob) {
    info!(retention_days = job.retention_days, "Archive job started");

    loop {
        let now = Utc::now();
        let Some(next) = job.next_run_after(now) else {
            info!("Archive schedule has no upcoming runs, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match job.run_once(Utc::now()) {
            Ok(archived) => info!(archived, "Archive sweep finished"),
            Err(e) => error!("Archive sweep failed: {}", e),
        }
    }
}
