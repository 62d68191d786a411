//! API route definitions.

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use super::state::AppState;
use super::{executions, reference, reports};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/execution-requests",
            post(executions::create_request).get(executions::list_requests),
        )
        .route("/execution-requests/{id}", get(executions::get_request))
        .route("/execution-requests/{id}/finish", post(executions::finish))
        .route("/execution-requests/{id}/labels", post(executions::attach_labels))
        .route(
            "/execution-requests/{id}/test-runs",
            post(executions::add_test_run).get(executions::list_test_runs),
        )
        .route("/test-runs/{id}", get(executions::get_test_run))
        .route("/test-runs/{id}/complete", post(executions::complete_test_run))
        .route(
            "/test-runs/{id}/log-records",
            post(executions::add_log_record).get(executions::list_log_records),
        )
        .route("/log-records/{id}", get(executions::get_log_record))
        .route(
            "/log-records/{id}/attachments/{name}",
            put(executions::upload_attachment).get(executions::download_attachment),
        )
        .route("/execution-requests/{id}/report", get(reports::render_html))
        .route("/execution-requests/{id}/report/summary", get(reports::summary))
        .route("/execution-requests/{id}/report/send", post(reports::send))
        .route(
            "/dictionaries/{category}",
            get(reference::dictionary).post(reference::create_dictionary_entry),
        )
        .route("/dictionary-entries/{id}", delete(reference::delete_dictionary_entry))
        .route("/defects", post(reference::create_defect).get(reference::list_defects))
        .route("/defects/{id}", get(reference::get_defect))
        .route("/defects/{id}/links", post(reference::link_defect))
        .route("/labels", get(reference::labels))
        .route("/charts/pass-rate", get(reference::pass_rate_chart))
        .route(
            "/users/{user_id}/settings/{setting_type}",
            get(reference::get_setting).put(reference::put_setting),
        )
        .route(
            "/catalogue/projects/{id}/test-cases",
            get(reference::catalogue_test_cases),
        )
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    }))
}
