//! HTML rendering of execution reports (askama template `report.html`).

use askama::Template;

use super::builder::ExecutionReport;
use super::table::Table;
use crate::error::RamResult;

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    title: &'a str,
    project: Option<&'a str>,
    generated_at: String,
    tables: Vec<&'a Table>,
}

pub fn render(report: &ExecutionReport) -> RamResult<String> {
    let page = ReportPage {
        title: &report.title,
        project: report.project.as_deref(),
        generated_at: report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        tables: report.tables().to_vec(),
    };
    Ok(page.render()?)
}
