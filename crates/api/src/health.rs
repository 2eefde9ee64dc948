use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use nexus_core::Organization;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::AppState;

/// Current application version from Cargo.toml
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

static SERVER_START: OnceLock<Instant> = OnceLock::new();

pub fn mark_server_start() {
    SERVER_START.get_or_init(Instant::now);
}

fn get_uptime() -> Duration {
    SERVER_START.get().map(|start| start.elapsed()).unwrap_or_default()
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Nexus Submission Portal API",
        "version": CURRENT_VERSION,
        "status": "running"
    }))
}

/// Liveness plus the active operating mode
/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "mode": state.config.mode().as_str(),
        "uptimeSeconds": get_uptime().as_secs()
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub use_file_request: bool,
    pub mock_mode: bool,
    pub companies: Vec<&'static str>,
}

/// What the frontend needs to render the submission form
/// GET /api/config
pub async fn config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        use_file_request: state.config.use_file_request,
        mock_mode: state.config.mock_mode,
        companies: Organization::display_names(),
    })
}
