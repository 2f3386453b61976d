//! `GET /api/ws` — WebSocket fan-out of job status snapshots (§6.5).
//!
//! The browser opens one socket and receives an `init` frame with every
//! known job, then a `job_update` frame each time any job's snapshot
//! changes. There is no client-to-server protocol beyond the upgrade
//! itself; inbound frames are drained and discarded so pings/closes are
//! observed promptly.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use hfmirror_engine::Job;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::state::AppState;

#[derive(Serialize)]
struct InitData {
    jobs: Vec<Job>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsEvent {
    Init { data: InitData },
    JobUpdate { data: Job },
}

/// `GET /api/ws` — upgrade and hand off to [`run`].
pub async fn job_events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state))
}

async fn run(socket: WebSocket, state: AppState) {
    let (mut ws_sender, ws_receiver) = socket.split();

    let initial_jobs = state.job_manager.list_jobs().await;
    let mut last_seen: HashMap<String, Job> =
        initial_jobs.iter().map(|j| (j.id.clone(), j.clone())).collect();
    let init = WsEvent::Init { data: InitData { jobs: initial_jobs } };
    if send(&mut ws_sender, &init).await.is_err() {
        return;
    }

    // Ingest: drain inbound frames so a client close is noticed even while
    // egress is parked in wait_for_change().
    let mut ingest = tokio::spawn(async move {
        let mut ws_receiver = ws_receiver;
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let job_manager = state.job_manager.clone();
    let mut egress = tokio::spawn(async move {
        loop {
            job_manager.wait_for_change().await;
            let current = job_manager.list_jobs().await;
            for job in &current {
                if last_seen.get(&job.id) == Some(job) {
                    continue;
                }
                last_seen.insert(job.id.clone(), job.clone());
                let event = WsEvent::JobUpdate { data: job.clone() };
                if send(&mut ws_sender, &event).await.is_err() {
                    return;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
    }

    debug!("job events WebSocket closed");
}

async fn send(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &WsEvent,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).unwrap_or_default();
    sender.send(Message::Text(payload.into())).await
}
