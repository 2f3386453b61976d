//! Server-mode job manager (§4.10): job creation with deduplication, status
//! tracking, and cancellation, built on top of [`crate::orchestrator::run`].

use crate::orchestrator;
use hfmirror_core::{
    EngineResult, EventKind, HttpBackend, HubClientPort, JobRequest, JobProgress, JobStatus,
    ProgressEmitter, ProgressEvent, Settings,
};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;

/// Dedup key for a server-mode job: repository, revision, and dataset flag.
type DedupKey = (String, String, bool);

fn dedup_key(job: &JobRequest) -> DedupKey {
    (job.repo.to_string(), job.effective_revision().to_string(), job.repo.is_dataset)
}

/// A snapshot of one server-mode job, as returned to API/WebSocket callers.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Job {
    /// Short, server-generated job identifier.
    pub id: String,
    /// The request that created this job.
    pub request: JobRequest,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Aggregate progress snapshot.
    pub progress: JobProgress,
    /// Error message, set only when `status == failed`.
    pub error: Option<String>,
}

struct ActiveJob {
    cancel: CancellationToken,
}

struct Inner {
    jobs: Mutex<HashMap<String, Job>>,
    active: Mutex<HashMap<String, ActiveJob>>,
    notify: Notify,
}

/// Tracks every in-flight and completed server-mode job, deduplicating by
/// `(repo, revision, is_dataset)` and fanning progress events out to the
/// matching job's snapshot.
pub struct JobManager<H: HubClientPort, B: HttpBackend> {
    hub: Arc<H>,
    backend: Arc<B>,
    settings: Arc<RwLock<Settings>>,
    inner: Arc<Inner>,
}

impl<H: HubClientPort + 'static, B: HttpBackend + 'static> JobManager<H, B> {
    /// Build a job manager over a hub client and HTTP backend shared by
    /// every job it spawns. `settings` is shared with the settings API so
    /// that token/concurrency changes apply to jobs started afterward
    /// (output directories are never mutable via the API).
    #[must_use]
    pub fn new(hub: Arc<H>, backend: Arc<B>, settings: Arc<RwLock<Settings>>) -> Self {
        Self {
            hub,
            backend,
            settings,
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                active: Mutex::new(HashMap::new()),
                notify: Notify::new(),
            }),
        }
    }

    /// Create a job for `request`, or return the existing running/queued
    /// job for the same `(repo, revision, is_dataset)` tuple (the
    /// deduplication invariant). The bool is `true` when an existing job
    /// was returned instead of a new one.
    pub async fn create_job(self: &Arc<Self>, request: JobRequest) -> (Job, bool) {
        let key = dedup_key(&request);

        let id = new_job_id();
        let job = Job {
            id: id.clone(),
            request: request.clone(),
            status: JobStatus::Queued,
            progress: JobProgress::default(),
            error: None,
        };

        {
            // Hold the guard across find-and-insert so two concurrent
            // requests for the same (repo, revision, is_dataset) can never
            // both observe no existing job (§4.10's dedup invariant).
            let mut jobs = self.inner.jobs.lock().await;
            if let Some(existing) = jobs
                .values()
                .find(|j| dedup_key(&j.request) == key && !j.status.is_terminal())
            {
                return (existing.clone(), true);
            }
            jobs.insert(id.clone(), job.clone());
        }

        let cancel = CancellationToken::new();
        {
            let mut active = self.inner.active.lock().await;
            active.insert(id.clone(), ActiveJob { cancel: cancel.clone() });
        }

        let manager = Arc::clone(self);
        let job_id = id.clone();
        tokio::spawn(async move {
            manager.run_job(job_id, request, cancel).await;
        });

        (job, false)
    }

    /// Look up a job snapshot by id.
    pub async fn get_job(&self, id: &str) -> Option<Job> {
        self.inner.jobs.lock().await.get(id).cloned()
    }

    /// Snapshot of every known job, in no particular order.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.inner.jobs.lock().await.values().cloned().collect()
    }

    /// Cancel a queued or running job. Returns `false` if `id` is unknown.
    pub async fn cancel_job(&self, id: &str) -> bool {
        let handle = self.inner.active.lock().await.get(id).map(|a| a.cancel.clone());
        let Some(cancel) = handle else {
            return false;
        };
        cancel.cancel();

        let mut jobs = self.inner.jobs.lock().await;
        if let Some(job) = jobs.get_mut(id) {
            job.status = JobStatus::Cancelled;
        }
        drop(jobs);
        self.inner.notify.notify_waiters();
        true
    }

    async fn run_job(self: Arc<Self>, id: String, request: JobRequest, cancel: CancellationToken) {
        self.set_status(&id, JobStatus::Running).await;

        let emitter: Arc<dyn ProgressEmitter> = Arc::new(JobEventSink {
            id: id.clone(),
            inner: Arc::clone(&self.inner),
        });
        let backend: Arc<dyn HttpBackend> = Arc::clone(&self.backend);
        let settings = self.settings.read().await.clone();

        let result: EngineResult<()> = orchestrator::run(
            self.hub.as_ref(),
            &backend,
            &request,
            &settings,
            &emitter,
            &cancel,
        )
        .await;

        let mut jobs = self.inner.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = match &result {
                Ok(()) => JobStatus::Completed,
                Err(hfmirror_core::EngineError::Cancelled) => JobStatus::Cancelled,
                Err(_) => JobStatus::Failed,
            };
            job.error = result.err().map(|e| e.to_string());
        }
        drop(jobs);

        self.inner.active.lock().await.remove(&id);
        self.inner.notify.notify_waiters();
    }

    async fn set_status(&self, id: &str, status: JobStatus) {
        let mut jobs = self.inner.jobs.lock().await;
        if let Some(job) = jobs.get_mut(id) {
            job.status = status;
        }
        drop(jobs);
        self.inner.notify.notify_waiters();
    }

    /// Wait until any job's snapshot changes, for WebSocket fan-out
    /// (§6's `GET /api/ws`). Callers re-check state after waking since
    /// `Notify` coalesces concurrent wakeups.
    pub async fn wait_for_change(&self) {
        self.inner.notify.notified().await;
    }
}

/// Bridges engine progress events into a job's snapshot (§5's
/// lock-then-unlock-then-notify discipline: never notify while holding the
/// job lock).
struct JobEventSink {
    id: String,
    inner: Arc<Inner>,
}

impl ProgressEmitter for JobEventSink {
    fn emit(&self, event: ProgressEvent) {
        let inner = Arc::clone(&self.inner);
        let id = self.id.clone();
        tokio::spawn(async move {
            {
                let mut jobs = inner.jobs.lock().await;
                if let Some(job) = jobs.get_mut(&id) {
                    apply_event(&mut job.progress, &event);
                }
            }
            inner.notify.notify_waiters();
        });
    }
}

fn apply_event(progress: &mut JobProgress, event: &ProgressEvent) {
    match event.kind {
        EventKind::PlanItem => {
            progress.total_files += 1;
            progress.total_bytes += event.total_bytes.unwrap_or(0);
        }
        EventKind::FileProgress => {
            if let Some(current) = event.current_bytes {
                progress.downloaded_bytes = progress.downloaded_bytes.max(current);
            }
        }
        EventKind::FileDone => {
            progress.completed_files += 1;
        }
        _ => {}
    }
}

fn new_job_id() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..8).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfmirror_core::RepoRef;

    fn request(owner: &str) -> JobRequest {
        JobRequest::new(RepoRef::parse(&format!("{owner}/model"), false).unwrap())
    }

    #[test]
    fn dedup_key_distinguishes_dataset_flag() {
        let mut model = request("a");
        let mut dataset = request("a");
        dataset.repo.is_dataset = true;
        assert_ne!(dedup_key(&model), dedup_key(&dataset));
        model.revision = "v2".to_string();
        assert_ne!(dedup_key(&model), dedup_key(&request("a")));
    }

    #[test]
    fn job_ids_are_eight_lowercase_alphanumerics() {
        let id = new_job_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
