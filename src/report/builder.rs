//! Aggregates one execution request into report tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::column::{status_cell, PercentColumn};
use super::table::{Cell, Table};
use crate::lists::ListComparator;
use crate::model::{ExecutionRequest, StatusCounters, TestRun};

/// Fully built report for one execution request.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub title: String,
    pub project: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub summary: Table,
    pub groups: Table,
    pub test_runs: Table,
}

impl ExecutionReport {
    pub fn tables(&self) -> [&Table; 3] {
        [&self.summary, &self.groups, &self.test_runs]
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n", self.title);
        if let Some(project) = &self.project {
            out.push_str(&format!("Project: {}\n", project));
        }
        for table in self.tables() {
            out.push('\n');
            out.push_str(&table.render_text());
        }
        out
    }
}

/// Label group: the sorted label list shared by a set of test runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    pub labels: Vec<String>,
    pub counters: StatusCounters,
}

/// Group completed runs by their sorted labels. Groups are ordered with the
/// list comparator: fewer labels first, then label by label.
pub fn label_groups(runs: &[TestRun]) -> Vec<LabelGroup> {
    let mut by_labels: HashMap<Vec<String>, StatusCounters> = HashMap::new();
    for run in runs.iter().filter(|r| r.is_completed()) {
        let mut key = run.labels.clone();
        key.sort();
        by_labels.entry(key).or_default().record(run.status);
    }

    let comparator = ListComparator::natural();
    let mut groups: Vec<LabelGroup> = by_labels
        .into_iter()
        .map(|(labels, counters)| LabelGroup { labels, counters })
        .collect();
    groups.sort_by(|a, b| comparator.compare(&a.labels, &b.labels));
    groups
}

pub fn build(er: &ExecutionRequest, runs: &[TestRun], project: Option<String>) -> ExecutionReport {
    ExecutionReport {
        title: format!("Execution request: {}", er.name),
        project,
        generated_at: Utc::now(),
        summary: summary_table(er),
        groups: groups_table(runs),
        test_runs: test_runs_table(runs),
    }
}

fn summary_table(er: &ExecutionRequest) -> Table {
    let c = &er.counters;
    let mut table = Table::new("Summary", &["Metric", "Value"]);
    let mut row = |metric: &str, value: Cell| table.push_row(vec![Cell::plain(metric), value]);

    row("Status", Cell::plain(er.status.to_string()));
    row("Environment", Cell::plain(er.environment.clone().unwrap_or_default()));
    row("Executor", Cell::plain(er.executor_name.clone().unwrap_or_default()));
    row("Labels", Cell::plain(er.labels.join(", ")));
    row("Started", Cell::plain(er.start_date.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
    row("Duration", Cell::plain(format_duration(er.duration_secs)));
    row("Total", Cell::plain(c.total().to_string()));
    row("Passed", Cell::plain(c.passed.to_string()));
    row("Failed", Cell::plain(c.failed.to_string()));
    row("Warning", Cell::plain(c.warning.to_string()));
    row("Skipped", Cell::plain(c.skipped.to_string()));
    row("Blocked", Cell::plain(c.blocked.to_string()));
    row(
        "Pass rate",
        PercentColumn::with_suffix(format!(" ({}/{})", c.passed, c.total())).cell(er.passed_rate),
    );
    table
}

fn groups_table(runs: &[TestRun]) -> Table {
    let mut table = Table::new("Label groups", &["Labels", "Total", "Passed", "Failed", "Pass rate"]);
    for group in label_groups(runs) {
        let labels = if group.labels.is_empty() {
            "(no labels)".to_string()
        } else {
            group.labels.join(", ")
        };
        let c = group.counters;
        table.push_row(vec![
            Cell::plain(labels),
            Cell::plain(c.total().to_string()),
            Cell::plain(c.passed.to_string()),
            Cell::plain(c.failed.to_string()),
            PercentColumn::new().cell(c.passed_rate()),
        ]);
    }
    table
}

fn test_runs_table(runs: &[TestRun]) -> Table {
    let mut table = Table::new("Test runs", &["Name", "Status", "Duration", "Labels", "Comment"]);
    for run in runs {
        table.push_row(vec![
            Cell::plain(run.name.clone()),
            status_cell(run.status),
            Cell::plain(format_duration(run.duration_secs)),
            Cell::plain(run.labels.join(", ")),
            Cell::plain(run.comment.clone().unwrap_or_default()),
        ]);
    }
    table
}

fn format_duration(secs: i64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
