//! API layer -- axum routes, handlers, and middleware.

mod executions;
mod reference;
mod reports;
mod routes;
pub mod state;

#[cfg(test)]
mod tests;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use self::state::AppState;

/// Build the application router with all API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

/// Response body for successful calls: `{"data": ..., "meta": {...}}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub total: usize,
}

pub(crate) fn data<T: Serialize>(value: T) -> Json<Envelope<T>> {
    Json(Envelope { data: value, meta: None })
}

pub(crate) fn list<T: Serialize>(items: Vec<T>) -> Json<Envelope<Vec<T>>> {
    let total = items.len();
    Json(Envelope {
        data: items,
        meta: Some(Meta { total }),
    })
}
