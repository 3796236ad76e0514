//! Session state and effective configuration.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusConfig {
    pub save_path: String,
    pub likes_url: String,
    pub debug_mode: bool,
    pub debug_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    /// Live check when the browser is idle, else whether a session is saved.
    pub authenticated: bool,
    pub session_saved: bool,
    pub active_tasks: usize,
    pub total_tasks: usize,
    pub config: StatusConfig,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session_saved = state.session_store.has_saved().await;
    let authenticated = state
        .launcher
        .check_authentication()
        .await
        .unwrap_or(session_saved);
    let registry = state.registry();
    let config = &state.config;

    Json(StatusResponse {
        status: "ok",
        authenticated,
        session_saved,
        active_tasks: registry.active_count(),
        total_tasks: registry.len(),
        config: StatusConfig {
            save_path: config.save_path.display().to_string(),
            likes_url: config.likes_url(),
            debug_mode: config.debug_mode,
            debug_path: config
                .debug_mode
                .then(|| config.debug_path.display().to_string()),
        },
    })
}
