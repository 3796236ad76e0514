//! Integration tests for the Axum web server.
//!
//! Routes are driven with `oneshot` against a stub launcher, so no browser
//! is ever started.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use lyubitori_axum::{AxumContext, create_router};
use lyubitori_core::{ScraperConfig, TaskRecord};
use lyubitori_download::{DownloadRequest, TaskLauncher, TaskRegistry};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Registers tasks without running them.
#[derive(Default)]
struct StubLauncher {
    registry: TaskRegistry,
    requests: Mutex<Vec<DownloadRequest>>,
    live_auth: Option<bool>,
}

#[async_trait]
impl TaskLauncher for StubLauncher {
    fn launch(&self, request: DownloadRequest) -> TaskRecord {
        self.requests.lock().unwrap().push(request);
        let record = TaskRecord::pending("https://x.com/someone/likes", request.max_scroll, request.debug);
        self.registry.create(record.clone());
        record
    }

    fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    async fn check_authentication(&self) -> Option<bool> {
        self.live_auth
    }
}

struct TestApp {
    launcher: Arc<StubLauncher>,
    config: Arc<ScraperConfig>,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_launcher(StubLauncher::default())
    }

    fn with_launcher(launcher: StubLauncher) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ScraperConfig {
            username: Some("someone".to_string()),
            save_path: dir.path().join("downloaded"),
            session_path: dir.path().join("session"),
            ..ScraperConfig::default()
        };
        Self {
            launcher: Arc::new(launcher),
            config: Arc::new(config),
            _dir: dir,
        }
    }

    fn router(&self) -> Router {
        let launcher: Arc<dyn TaskLauncher> = self.launcher.clone();
        create_router(AxumContext::new(launcher, Arc::clone(&self.config)))
    }

    fn requests(&self) -> Vec<DownloadRequest> {
        self.launcher.requests.lock().unwrap().clone()
    }

    async fn call(&self, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
        let response = self
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call("GET", uri, Body::empty()).await
    }

    async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        self.call("POST", uri, Body::from(body.to_string())).await
    }
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn index_lists_endpoints() {
    let app = TestApp::new();
    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Lyubitori API");
    assert!(body["endpoints"]["POST /download"].is_string());
    assert!(body["endpoints"]["POST /tasks/{id}/cancel"].is_string());
}

#[tokio::test]
async fn status_reports_session_and_config() {
    let app = TestApp::new();
    let (status, body) = app.get("/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["session_saved"], false);
    assert_eq!(body["active_tasks"], 0);
    assert_eq!(body["total_tasks"], 0);
    assert_eq!(body["config"]["likes_url"], "https://x.com/someone/likes");
    assert_eq!(body["config"]["debug_mode"], false);
    assert!(body["config"]["debug_path"].is_null());
}

#[tokio::test]
async fn status_sees_saved_session() {
    let app = TestApp::new();
    let cookies = app.config.cookies_file();
    std::fs::create_dir_all(cookies.parent().unwrap()).unwrap();
    std::fs::write(&cookies, r#"[{"name":"auth_token","value":"t"}]"#).unwrap();

    let (_, body) = app.get("/status").await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["session_saved"], true);
}

#[tokio::test]
async fn status_prefers_live_check_over_saved_session() {
    let app = TestApp::with_launcher(StubLauncher {
        live_auth: Some(false),
        ..StubLauncher::default()
    });
    let cookies = app.config.cookies_file();
    std::fs::create_dir_all(cookies.parent().unwrap()).unwrap();
    std::fs::write(&cookies, r#"[{"name":"auth_token","value":"t"}]"#).unwrap();

    let (_, body) = app.get("/status").await;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["session_saved"], true);
}

#[tokio::test]
async fn download_with_empty_body_uses_defaults() {
    let app = TestApp::new();
    let (status, body) = app.post("/download", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Download task started");
    assert_eq!(body["debug_enabled"], false);
    assert!(body["task_id"].as_str().is_some());
    assert_eq!(app.requests(), vec![DownloadRequest::new(100, false)]);
}

#[tokio::test]
async fn refresh_defaults_to_shorter_run() {
    let app = TestApp::new();
    let (status, body) = app.post("/refresh", r#"{"debug": true}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Refresh task started");
    assert_eq!(body["debug_enabled"], true);
    assert_eq!(app.requests(), vec![DownloadRequest::new(50, true)]);
}

#[tokio::test]
async fn download_rejects_malformed_body() {
    let app = TestApp::new();
    let (status, body) = app.post("/download", r#"{"max_scroll": "lots"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(app.requests().is_empty());
}

#[tokio::test]
async fn started_task_is_listed_and_fetchable() {
    let app = TestApp::new();
    let (_, started) = app.post("/download", r#"{"max_scroll": 3}"#).await;
    let task_id = started["task_id"].as_str().unwrap().to_string();

    let (status, list) = app.get("/tasks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(list["tasks"][0]["task_id"], task_id.as_str());

    let (status, task) = app.get(&format!("/tasks/{task_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "pending");
    assert_eq!(task["max_scroll"], 3);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/tasks/7a1c1d1e-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
    assert_eq!(body["status"], 404);

    let (status, _) = app.get("/tasks/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/tasks/7a1c1d1e-0000-4000-8000-000000000000/cancel", "")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_pending_then_finished() {
    let app = TestApp::new();
    let (_, started) = app.post("/download", "").await;
    let task_id = started["task_id"].as_str().unwrap().to_string();

    let (status, body) = app.post(&format!("/tasks/{task_id}/cancel"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let id = task_id.parse().unwrap();
    app.launcher.registry.fail(id, "boom");

    let (status, body) = app.post(&format!("/tasks/{task_id}/cancel"), "").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://example.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
