//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use serde_json::json;
use tower::ServiceExt;

use crate::api::router;
use crate::api::state::AppState;
use crate::catalogue::{Project, TestCase, TestCatalogue};
use crate::config::MailConfig;
use crate::error::RamResult;
use crate::files::FileStore;
use crate::mail::{MailRequest, MailSender};
use crate::service::{ExecutionService, FinishRequest};
use crate::storage::Pool;

struct FixedCatalogue;

#[async_trait]
impl TestCatalogue for FixedCatalogue {
    async fn get_project(&self, id: uuid::Uuid) -> RamResult<Option<Project>> {
        Ok(Some(Project {
            id,
            name: "Billing".to_string(),
        }))
    }

    async fn list_test_cases(&self, _project_id: uuid::Uuid) -> RamResult<Vec<TestCase>> {
        Ok(vec![TestCase {
            id: uuid::Uuid::nil(),
            name: "Login with SSO".to_string(),
            jira_ticket: None,
            labels: Vec::new(),
        }])
    }
}

#[derive(Default)]
struct RecordingMail {
    sent: std::sync::Mutex<Vec<MailRequest>>,
}

#[async_trait]
impl MailSender for RecordingMail {
    async fn send(&self, mail: &MailRequest) -> RamResult<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

fn app(mail: Arc<RecordingMail>, attachments: &std::path::Path) -> axum::Router {
    app_with_pool(crate::storage::open_memory_pool().unwrap(), mail, attachments)
}

fn app_with_pool(pool: Pool, mail: Arc<RecordingMail>, attachments: &std::path::Path) -> axum::Router {
    let mail_config = MailConfig {
        default_recipients: vec!["qa-leads@example.com".to_string()],
        ..MailConfig::default()
    };
    router(AppState::new(
        pool,
        FileStore::new(attachments),
        Arc::new(FixedCatalogue),
        mail,
        mail_config,
    ))
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (u16, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());
    let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_execution_flow_to_report_summary_and_mail() {
    let dir = tempfile::tempdir().unwrap();
    let mail = Arc::new(RecordingMail::default());
    let app = app(mail.clone(), dir.path());

    let (status, er) = call(
        &app,
        "POST",
        "/api/v1/execution-requests",
        Some(json!({ "name": "nightly", "project_id": uuid::Uuid::new_v4(), "labels": ["smoke"] })),
    )
    .await;
    assert_eq!(status, 201);
    let er_id = er["data"]["id"].as_str().unwrap().to_string();

    for (name, result) in [("login", "PASSED"), ("logout", "FAILED")] {
        let (status, run) = call(
            &app,
            "POST",
            &format!("/api/v1/execution-requests/{}/test-runs", er_id),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, 201);
        let run_id = run["data"]["id"].as_str().unwrap().to_string();
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/test-runs/{}/complete", run_id),
            Some(json!({ "status": result })),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (status, er) = call(&app, "GET", &format!("/api/v1/execution-requests/{}", er_id), None).await;
    assert_eq!(status, 200);
    assert_eq!(er["data"]["passed_rate"], 50);

    let (status, summary) = call(
        &app,
        "GET",
        &format!("/api/v1/execution-requests/{}/report/summary", er_id),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(summary["data"]["project"], "Billing");

    let (status, sent) = call(
        &app,
        "POST",
        &format!("/api/v1/execution-requests/{}/report/send", er_id),
        Some(json!({ "recipients": "dev@example.com,qa-leads@example.com" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(sent["data"]["to"], "dev@example.com,qa-leads@example.com");
    let sent = mail.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].content.contains("Billing"));
}

#[tokio::test]
async fn test_missing_execution_request_is_ram_0001() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());
    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/v1/execution-requests/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["reason"], "RAM-0001");
}

#[tokio::test]
async fn test_unknown_setting_type_is_ram_9000() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());
    let (status, body) = call(&app, "GET", "/api/v1/users/alice/settings/colors", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["reason"], "RAM-9000");

    let (status, _) = call(
        &app,
        "PUT",
        "/api/v1/users/alice/settings/report-widgets",
        Some(json!(["summary", "groups"])),
    )
    .await;
    assert_eq!(status, 200);
    let (_, body) = call(&app, "GET", "/api/v1/users/alice/settings/report-widgets", None).await;
    assert_eq!(body["data"], json!(["summary", "groups"]));
}

#[tokio::test]
async fn test_chart_filter_argument_count_is_ram_8000() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());
    let (status, body) = call(&app, "GET", "/api/v1/charts/pass-rate?filters=period:2026-01-01", None).await;
    assert_eq!(status, 500);
    assert_eq!(body["reason"], "RAM-8000");
}

#[tokio::test]
async fn test_dictionary_lookup_and_catalogue_forward() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());

    let (status, body) = call(&app, "GET", "/api/v1/dictionaries/Root%20Cause", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["name"], "Not Analyzed");
    assert_eq!(body["meta"]["total"], 5);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/v1/catalogue/projects/{}/test-cases", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["name"], "Login with SSO");
}

#[tokio::test]
async fn test_attachment_upload_and_download() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());

    let (_, er) = call(&app, "POST", "/api/v1/execution-requests", Some(json!({ "name": "nightly" }))).await;
    let er_id = er["data"]["id"].as_str().unwrap().to_string();
    let (_, run) = call(
        &app,
        "POST",
        &format!("/api/v1/execution-requests/{}/test-runs", er_id),
        Some(json!({ "name": "login" })),
    )
    .await;
    let run_id = run["data"]["id"].as_str().unwrap().to_string();
    let (status, record) = call(
        &app,
        "POST",
        &format!("/api/v1/test-runs/{}/log-records", run_id),
        Some(json!({ "name": "open page" })),
    )
    .await;
    assert_eq!(status, 201);
    let record_id = record["data"]["id"].as_str().unwrap().to_string();

    let upload = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/log-records/{}/attachments/page.txt", record_id))
        .header("content-type", "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let download = Request::builder()
        .uri(format!("/api/v1/log-records/{}/attachments/page.txt", record_id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(download).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello");
}

#[tokio::test]
async fn test_unknown_route_is_plain_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(Arc::default(), dir.path());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"not found");

    let (status, body) = call(&app, "GET", "/api/v1/no-such-resource", None).await;
    assert_eq!(status, 404);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn test_upload_to_archived_request_keeps_stored_file() {
    let dir = tempfile::tempdir().unwrap();
    let pool = crate::storage::open_memory_pool().unwrap();
    let executions = ExecutionService::new(pool.clone());
    let app = app_with_pool(pool, Arc::default(), dir.path());

    let er = executions
        .create(crate::model::NewExecutionRequest {
            name: "last month".to_string(),
            ..Default::default()
        })
        .unwrap();
    let run = executions
        .add_test_run(
            er.id,
            crate::model::NewTestRun {
                name: "login".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
    let (status, record) = call(
        &app,
        "POST",
        &format!("/api/v1/test-runs/{}/log-records", run.id),
        Some(json!({ "name": "open page" })),
    )
    .await;
    assert_eq!(status, 201);
    let record_id = record["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/log-records/{}/attachments/page.txt", record_id);

    let upload = |body: &'static str| {
        Request::builder()
            .method("PUT")
            .uri(&uri)
            .header("content-type", "text/plain")
            .body(Body::from(body))
            .unwrap()
    };
    let response = app.clone().oneshot(upload("original")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    executions
        .finish(
            er.id,
            FinishRequest {
                finish_date: Some(chrono::Utc::now() - chrono::Duration::days(60)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        executions
            .archive_older_than(chrono::Utc::now() - chrono::Duration::days(30))
            .unwrap(),
        1
    );

    let response = app.clone().oneshot(upload("TAMPERED")).await.unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["reason"], "RAM-0004");

    let download = Request::builder().uri(&uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(download).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"original");

    let record_dir = dir.path().join(&record_id);
    let names: Vec<_> = std::fs::read_dir(&record_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["page.txt"]);
}
