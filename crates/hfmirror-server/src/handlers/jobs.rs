//! Job handlers: `download`, `plan`, and job lifecycle lookups (§6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hfmirror_core::{JobRequest, RepoRef};
use hfmirror_engine::Job;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

/// Shared request body for `POST /api/download` and `POST /api/plan`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub repo: String,
    pub revision: Option<String>,
    pub dataset: Option<bool>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub append_filter_subdir: bool,
}

fn to_job_request(req: DownloadRequest) -> Result<JobRequest, HttpError> {
    let repo = RepoRef::parse(&req.repo, req.dataset.unwrap_or(false))
        .ok_or_else(|| HttpError::BadRequest(format!("malformed repository id: {}", req.repo)))?;

    let mut job = JobRequest::new(repo);
    if let Some(revision) = req.revision {
        job.revision = revision;
    }
    job.filters = req.filters;
    job.excludes = req.excludes;
    job.append_filter_subdir = req.append_filter_subdir;
    Ok(job)
}

/// `POST /api/download` - create a job, or return the existing one for the
/// same `(repo, revision, is_dataset)` tuple (§4.10's deduplication invariant).
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Result<(StatusCode, Json<Job>), HttpError> {
    let job_request = to_job_request(req)?;
    let (job, was_existing) = state.job_manager.create_job(job_request).await;
    let status = if was_existing { StatusCode::OK } else { StatusCode::ACCEPTED };
    Ok((status, Json(job)))
}

/// `GET /api/jobs/{id}`.
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>, HttpError> {
    state
        .job_manager
        .get_job(&id)
        .await
        .map(Json)
        .ok_or(HttpError::JobNotFound(id))
}

/// `GET /api/jobs`.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.job_manager.list_jobs().await)
}

/// `DELETE /api/jobs/{id}`.
pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, HttpError> {
    if state.job_manager.cancel_job(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::JobNotFound(id))
    }
}

#[derive(Debug, Serialize)]
struct PlannedFile {
    path: String,
    size: u64,
    lfs: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    repo: String,
    revision: String,
    files: Vec<PlannedFile>,
    total_size: u64,
    total_files: usize,
}

/// `POST /api/plan` - dry run: walk the tree and build the plan without
/// downloading anything.
pub async fn plan(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<PlanResponse>, HttpError> {
    let job_request = to_job_request(req)?;
    let settings = state.settings.read().await.clone();

    let plan = hfmirror_engine::planner::plan(state.hub.as_ref(), &job_request, &settings)
        .await
        .map_err(HttpError::Engine)?;

    let files: Vec<PlannedFile> = plan
        .items
        .iter()
        .map(|item| PlannedFile {
            path: item.path.clone(),
            size: item.size,
            lfs: item.lfs,
        })
        .collect();

    Ok(Json(PlanResponse {
        repo: job_request.repo.to_string(),
        revision: job_request.effective_revision().to_string(),
        total_size: plan.total_size(),
        total_files: files.len(),
        files,
    }))
}
