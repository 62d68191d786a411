//! Report rendering and delivery.

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::AppState;
use super::{data, Envelope};
use crate::error::{RamError, RamResult};
use crate::mail::{MailRequest, Recipients};
use crate::report::{self, html, ExecutionReport};

pub async fn render_html(State(state): State<AppState>, Path(id): Path<Uuid>) -> RamResult<Html<String>> {
    let report = report::assemble(&state.executions, state.catalogue.as_ref(), id).await?;
    Ok(Html(html::render(&report)?))
}

pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<ExecutionReport>>> {
    let report = report::assemble(&state.executions, state.catalogue.as_ref(), id).await?;
    Ok(data(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct SendReportBody {
    /// Comma-separated addresses; merged with the configured defaults.
    #[serde(default)]
    pub recipients: Recipients,
    pub cc: Option<Recipients>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SentReport {
    pub to: Recipients,
    pub subject: String,
}

pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SendReportBody>,
) -> RamResult<Json<Envelope<SentReport>>> {
    let defaults: Recipients = state.mail_config.default_recipients.iter().cloned().collect();
    let to = body.recipients.merged(&defaults);
    if to.is_empty() {
        return Err(RamError::InvalidRequest("no report recipients".to_string()));
    }

    let report = report::assemble(&state.executions, state.catalogue.as_ref(), id).await?;
    let subject = body.subject.unwrap_or_else(|| report.title.clone());
    let mail = MailRequest {
        from: state.mail_config.from.clone(),
        to,
        cc: body.cc.filter(|cc| !cc.is_empty()),
        subject,
        content: html::render(&report)?,
    };
    state.mail.send(&mail).await?;

    tracing::info!(execution_request_id = %id, to = %mail.to.to_header(), "report sent");
    Ok(data(SentReport {
        to: mail.to,
        subject: mail.subject,
    }))
}
