//! Dictionaries, defects, labels, charts, user settings and the catalogue
//! pass-through.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::state::AppState;
use super::{data, list, Envelope};
use crate::catalogue::TestCase;
use crate::charts::{self, ChartFilter, ChartPoint};
use crate::dictionary::DictionaryEntry;
use crate::error::RamResult;
use crate::model::{Defect, DefectLink, Label, NewDefect};

pub async fn dictionary(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> RamResult<Json<Envelope<Vec<DictionaryEntry>>>> {
    Ok(list(state.dictionary.list_category(&category)?))
}

#[derive(Debug, Deserialize)]
pub struct NewEntryBody {
    pub name: String,
}

pub async fn create_dictionary_entry(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(body): Json<NewEntryBody>,
) -> RamResult<(StatusCode, Json<Envelope<DictionaryEntry>>)> {
    let entry = state.dictionary.create(&category, &body.name)?;
    Ok((StatusCode::CREATED, data(entry)))
}

pub async fn delete_dictionary_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<StatusCode> {
    state.dictionary.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_defect(
    State(state): State<AppState>,
    Json(body): Json<NewDefect>,
) -> RamResult<(StatusCode, Json<Envelope<Defect>>)> {
    let defect = state.defects.create(body)?;
    Ok((StatusCode::CREATED, data(defect)))
}

#[derive(Debug, Deserialize)]
pub struct DefectQuery {
    pub execution_request_id: Option<Uuid>,
}

pub async fn list_defects(
    State(state): State<AppState>,
    Query(query): Query<DefectQuery>,
) -> RamResult<Json<Envelope<Vec<Defect>>>> {
    Ok(list(state.defects.list(query.execution_request_id)?))
}

pub async fn get_defect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RamResult<Json<Envelope<Defect>>> {
    Ok(data(state.defects.get(id)?))
}

pub async fn link_defect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(link): Json<DefectLink>,
) -> RamResult<Json<Envelope<Defect>>> {
    Ok(data(state.defects.link(id, link)?))
}

pub async fn labels(State(state): State<AppState>) -> RamResult<Json<Envelope<Vec<Label>>>> {
    Ok(list(state.executions.labels()?))
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// `;`-separated filters, e.g. `label:smoke;last:20`.
    #[serde(default)]
    pub filters: String,
}

pub async fn pass_rate_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> RamResult<Json<Envelope<Vec<ChartPoint>>>> {
    let filters = ChartFilter::parse_list(&query.filters)?;
    Ok(list(charts::pass_rate(&state.executions, &filters)?))
}

pub async fn get_setting(
    State(state): State<AppState>,
    Path((user_id, setting_type)): Path<(String, String)>,
) -> RamResult<Json<Envelope<Option<Value>>>> {
    Ok(data(state.settings.get(&user_id, &setting_type)?))
}

pub async fn put_setting(
    State(state): State<AppState>,
    Path((user_id, setting_type)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> RamResult<Json<Envelope<Value>>> {
    state.settings.put(&user_id, &setting_type, &value)?;
    Ok(data(value))
}

pub async fn catalogue_test_cases(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> RamResult<Json<Envelope<Vec<TestCase>>>> {
    Ok(list(state.catalogue.list_test_cases(project_id).await?))
}
