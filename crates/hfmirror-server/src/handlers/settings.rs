//! Live engine settings: read and partial update (§6.4).

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use hfmirror_core::{Settings, VerifyMode};
use serde::Deserialize;

use crate::error::HttpError;
use crate::state::AppState;

/// Partial update body for `POST /api/settings`.
///
/// `output_root` is deliberately absent: the mirrored directory is fixed at
/// server startup and is never taken from a request.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub connections: Option<u32>,
    pub max_active: Option<u32>,
    pub multipart_threshold_bytes: Option<u64>,
    pub verify_mode: Option<VerifyMode>,
    pub retries: Option<u32>,
    pub backoff_initial_ms: Option<u64>,
    pub backoff_max_ms: Option<u64>,
    /// `null` or omitted leaves the token unchanged; an empty string clears it.
    pub token: Option<String>,
    pub endpoint: Option<String>,
}

fn apply(current: &Settings, update: SettingsUpdate) -> Settings {
    let mut next = current.clone();
    if let Some(connections) = update.connections {
        next.connections = connections;
    }
    if let Some(max_active) = update.max_active {
        next.max_active = max_active;
    }
    if let Some(bytes) = update.multipart_threshold_bytes {
        next.multipart_threshold_bytes = bytes;
    }
    if let Some(mode) = update.verify_mode {
        next.verify_mode = mode;
    }
    if let Some(retries) = update.retries {
        next.retries = retries;
    }
    if let Some(ms) = update.backoff_initial_ms {
        next.backoff_initial = Duration::from_millis(ms);
    }
    if let Some(ms) = update.backoff_max_ms {
        next.backoff_max = Duration::from_millis(ms);
    }
    if let Some(token) = update.token {
        next.token = if token.is_empty() { None } else { Some(token) };
    }
    if let Some(endpoint) = update.endpoint {
        next.endpoint = if endpoint.is_empty() { None } else { Some(endpoint) };
    }
    next
}

/// `GET /api/settings` - current settings with the token masked.
pub async fn get(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.read().await.masked())
}

/// `POST /api/settings` - merge the given fields into the live settings.
///
/// Takes effect for jobs created after this call; jobs already running read
/// their settings snapshot once at start (see `job_manager`).
pub async fn update(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, HttpError> {
    let mut guard = state.settings.write().await;
    *guard = apply(&guard, update);
    Ok(Json(guard.masked()))
}
