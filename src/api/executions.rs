//! Execution requests, test runs, log records and their attachments.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::state::AppState;
use super::{data, list, Envelope};
use crate::error::{RamError, RamResult};
use crate::model::{
    Attachment, ExecutionRequest, ExecutionRequestFilter, LogRecord, NewExecutionRequest,
    NewLogRecord, NewTestRun, TestRun,
};
use crate::service::{FinishRequest, TestRunResult};

type Created<T> = (StatusCode, Json<Envelope<T>>);

pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<NewExecutionRequest>,
) -> RamResult<Created<ExecutionRequest>> {
    let er = state.executions.create(body)?;
    Ok((StatusCode::CREATED, data(er)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(filter): Query<ExecutionRequestFilter>,
) -> RamResult<Json<Envelope<Vec<ExecutionRequest>>>> {
    Ok(list(state.executions.list(&filter)?))
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<ExecutionRequest>>> {
    Ok(data(state.executions.get(id)?))
}

pub async fn finish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FinishRequest>,
) -> RamResult<Json<Envelope<ExecutionRequest>>> {
    Ok(data(state.executions.finish(id, body)?))
}

#[derive(Debug, Deserialize)]
pub struct LabelsBody {
    pub labels: Vec<String>,
}

pub async fn attach_labels(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LabelsBody>,
) -> RamResult<Json<Envelope<ExecutionRequest>>> {
    Ok(data(state.executions.attach_labels(id, &body.labels)?))
}

pub async fn add_test_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewTestRun>,
) -> RamResult<Created<TestRun>> {
    let run = state.executions.add_test_run(id, body)?;
    Ok((StatusCode::CREATED, data(run)))
}

pub async fn list_test_runs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<Vec<TestRun>>>> {
    Ok(list(state.executions.test_runs(id)?))
}

pub async fn get_test_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<TestRun>>> {
    Ok(data(state.executions.get_test_run(id)?))
}

pub async fn complete_test_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TestRunResult>,
) -> RamResult<Json<Envelope<TestRun>>> {
    Ok(data(state.executions.complete_test_run(id, body)?))
}

pub async fn add_log_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewLogRecord>,
) -> RamResult<Created<LogRecord>> {
    let record = state.executions.add_log_record(id, body)?;
    Ok((StatusCode::CREATED, data(record)))
}

pub async fn list_log_records(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<Vec<LogRecord>>>> {
    Ok(list(state.executions.log_records(id)?))
}

pub async fn get_log_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<LogRecord>>> {
    Ok(data(state.executions.get_log_record(id)?))
}

fn check_attachment_name(name: &str) -> RamResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(RamError::InvalidRequest(format!(
            "'{}' is not a valid attachment name",
            name
        )));
    }
    Ok(())
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> RamResult<Json<Envelope<LogRecord>>> {
    check_attachment_name(&name)?;
    state.executions.attachment_target(id)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let path = format!("{}/{}", id, name);
    let staged = format!("{}/.{}.upload", id, name);
    state.files.store(&staged, &body).await?;

    let recorded = state.executions.record_attachment(
        id,
        Attachment {
            name,
            content_type,
            path: path.clone(),
        },
    );
    match recorded {
        Ok(record) => {
            state.files.rename(&staged, &path).await?;
            Ok(data(record))
        }
        Err(e) => {
            if let Err(cleanup) = state.files.remove(&staged).await {
                tracing::warn!(path = %staged, error = %cleanup, "staged upload not removed");
            }
            Err(e)
        }
    }
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> RamResult<Response> {
    let record = state.executions.get_log_record(id)?;
    let attachment = record
        .attachments
        .into_iter()
        .find(|a| a.name == name)
        .ok_or_else(|| {
            RamError::InvalidRequest(format!("log record '{}' has no attachment '{}'", id, name))
        })?;

    let bytes = state.files.load(&attachment.path).await?;
    Ok(([(header::CONTENT_TYPE, attachment.content_type)], bytes).into_response())
}
