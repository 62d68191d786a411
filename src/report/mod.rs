//! Report building and rendering.
//!
//! `builder` aggregates an execution request into tables, `column` formats
//! individual cells, and `html` renders a built report through askama.

pub mod builder;
pub mod column;
pub mod html;
pub mod table;

pub use self::builder::{build, label_groups, ExecutionReport, LabelGroup};
pub use self::column::{CellColor, PercentColumn};
pub use self::table::{Cell, Table};

use uuid::Uuid;

use crate::catalogue::{self, TestCatalogue};
use crate::error::RamResult;
use crate::service::ExecutionService;

/// Load an execution request with its runs and build its report. The
/// project name comes from the catalogue when it answers.
pub async fn assemble(
    executions: &ExecutionService,
    catalogue: &dyn TestCatalogue,
    id: Uuid,
) -> RamResult<ExecutionReport> {
    let er = executions.get(id)?;
    let runs = executions.test_runs(id)?;
    let project = catalogue::project_name(catalogue, er.project_id).await;
    Ok(build(&er, &runs, project))
}
