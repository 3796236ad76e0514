//! Task handlers - starting, listing and cancelling download runs.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use lyubitori_core::{TaskId, TaskRecord};
use lyubitori_download::{DEFAULT_MAX_SCROLL, DEFAULT_REFRESH_SCROLL, DownloadRequest};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

/// Body of `POST /download` and `POST /refresh`. Every field is optional
/// and an empty body is accepted.
#[derive(Debug, Default, Deserialize)]
pub struct StartTaskBody {
    pub max_scroll: Option<u32>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize)]
pub struct StartTaskResponse {
    pub status: &'static str,
    pub task_id: TaskId,
    pub message: &'static str,
    pub debug_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: &'static str,
    pub message: &'static str,
}

fn parse_body(body: &[u8]) -> Result<StartTaskBody, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(StartTaskBody::default());
    }
    serde_json::from_slice::<Option<StartTaskBody>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| HttpError::BadRequest(format!("Invalid request body: {e}")))
}

/// Unknown and malformed ids are both reported as a missing task.
fn parse_task_id(raw: &str) -> Result<TaskId, HttpError> {
    raw.parse()
        .map_err(|_| HttpError::NotFound("Task not found".to_string()))
}

fn start(
    state: &AppState,
    body: &[u8],
    default_max_scroll: u32,
    message: &'static str,
) -> Result<Json<StartTaskResponse>, HttpError> {
    let body = parse_body(body)?;
    let request = DownloadRequest::new(body.max_scroll.unwrap_or(default_max_scroll), body.debug);
    let record = state.launcher.launch(request);

    tracing::info!(
        target: "lyubitori.http",
        task_id = %record.task_id,
        max_scroll = record.max_scroll,
        debug = record.debug,
        "{message}"
    );

    Ok(Json(StartTaskResponse {
        status: "success",
        task_id: record.task_id,
        message,
        debug_enabled: record.debug,
    }))
}

/// Start a full download of the likes feed.
pub async fn download(State(state): State<AppState>, body: Bytes) -> Result<Json<StartTaskResponse>, HttpError> {
    start(&state, &body, DEFAULT_MAX_SCROLL, "Download task started")
}

/// Start a shorter run that picks up recent likes.
pub async fn refresh(State(state): State<AppState>, body: Bytes) -> Result<Json<StartTaskResponse>, HttpError> {
    start(&state, &body, DEFAULT_REFRESH_SCROLL, "Refresh task started")
}

pub async fn list(State(state): State<AppState>) -> Json<TaskList> {
    Json(TaskList {
        tasks: state.registry().list(),
    })
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TaskRecord>, HttpError> {
    let id = parse_task_id(&id)?;
    state
        .registry()
        .get(id)
        .map(Json)
        .ok_or_else(|| HttpError::NotFound("Task not found".to_string()))
}

/// Request cooperative cancellation. The task moves to `cancelled` once
/// its run reaches the next round boundary.
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<CancelResponse>, HttpError> {
    let id = parse_task_id(&id)?;
    state.registry().cancel(id)?;
    Ok(Json(CancelResponse {
        status: "success",
        message: "Task cancellation requested",
    }))
}
