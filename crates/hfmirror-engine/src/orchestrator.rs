//! Worker-pool orchestrator: turns a [`Plan`](hfmirror_core::Plan) into bytes
//! on disk, bounded by `max_active` concurrent files (§4.8).

use crate::common::now_ms;
use crate::{downloader, planner, skip_oracle, verify};
use hfmirror_core::{
    EngineError, EngineResult, EventKind, EventLevel, HttpBackend, HubClientPort, JobRequest,
    PlanItem, ProgressEmitter, ProgressEvent, Settings,
};
use sha2::Digest as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Run one download job to completion, driving every plan item through the
/// skip oracle, downloader, and verifier (§4.8's 9-step contract).
///
/// Returns `Ok(())` on success; the cancellation error if `cancel` fired
/// before completion; otherwise the first worker error observed.
pub async fn run(
    hub: &dyn HubClientPort,
    backend: &Arc<dyn HttpBackend>,
    job: &JobRequest,
    settings: &Settings,
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    emitter.emit(
        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::ScanStart)
            .with_repo(job.repo.to_string(), job.effective_revision().to_string()),
    );

    let plan = planner::plan(hub, job, settings).await?;

    let repo_root = settings.output_root.join(job.repo.to_string());
    tokio::fs::create_dir_all(&repo_root).await.map_err(|e| EngineError::io(&e))?;

    let semaphore = Arc::new(Semaphore::new(settings.max_active.max(1) as usize));
    let (error_tx, mut error_rx) = mpsc::channel::<EngineError>(plan.items.len().max(1));
    let downloaded_count = Arc::new(AtomicU64::new(0));
    let skipped_count = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::with_capacity(plan.items.len());
    for item in plan.items {
        if cancel.is_cancelled() {
            break;
        }

        emitter.emit(
            ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::PlanItem)
                .with_repo(job.repo.to_string(), job.effective_revision().to_string())
                .with_path(item.path.clone())
                .with_bytes(0, item.size)
                .with_is_lfs(item.lfs),
        );

        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let destination = destination_for(&repo_root, &item);
        let backend = Arc::clone(backend);
        let settings = settings.clone();
        let emitter = Arc::clone(emitter);
        let cancel = cancel.clone();
        let error_tx = error_tx.clone();
        let downloaded_count = Arc::clone(&downloaded_count);
        let skipped_count = Arc::clone(&skipped_count);

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            match run_one(&backend, &item, &destination, &settings, &emitter, &cancel).await {
                Ok(true) => {
                    skipped_count.fetch_add(1, Ordering::Relaxed);
                }
                Ok(false) => {
                    downloaded_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    let _ = error_tx.send(e).await;
                }
            }
        }));
    }
    drop(error_tx);

    for handle in handles {
        let _ = handle.await;
    }

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    if let Some(first_error) = error_rx.recv().await {
        return Err(first_error);
    }

    let downloaded = downloaded_count.load(Ordering::Relaxed);
    let skipped = skipped_count.load(Ordering::Relaxed);
    emitter.emit(
        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::Done)
            .with_message(format!("downloaded: {downloaded}, skipped: {skipped}")),
    );
    Ok(())
}

fn destination_for(repo_root: &Path, item: &PlanItem) -> PathBuf {
    match &item.filter_subdir {
        Some(subdir) => repo_root.join(subdir).join(&item.path),
        None => repo_root.join(&item.path),
    }
}

/// Returns `Ok(true)` if the file was skipped, `Ok(false)` if it was
/// downloaded and verified.
async fn run_one(
    backend: &Arc<dyn HttpBackend>,
    item: &PlanItem,
    destination: &Path,
    settings: &Settings,
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<bool> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| EngineError::io(&e))?;
    }

    let local_sha256 = if item.lfs && item.sha256_is_real && !item.sha256.is_empty() {
        tokio::fs::read(destination)
            .await
            .ok()
            .map(|bytes| hex::encode(sha2::Sha256::digest(&bytes)))
    } else {
        None
    };

    let decision = skip_oracle::should_skip(item, destination, local_sha256.as_deref());
    if let skip_oracle::SkipDecision::Skip(reason) = decision {
        emitter.emit(
            ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::FileDone)
                .with_path(item.path.clone())
                .with_message(format!("skip ({reason})")),
        );
        return Ok(true);
    }

    emitter.emit(
        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::FileStart)
            .with_path(item.path.clone())
            .with_bytes(0, item.size),
    );

    downloader::download(backend, item, destination, settings, emitter, cancel).await?;
    verify::verify(destination, item, settings.verify_mode, backend.as_ref()).await?;

    emitter.emit(
        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::FileDone)
            .with_path(item.path.clone()),
    );
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_honors_filter_subdir() {
        let item = PlanItem {
            path: "model.bin".to_string(),
            url: String::new(),
            lfs: true,
            sha256: String::new(),
            sha256_is_real: false,
            size: 1,
            accept_ranges: true,
            filter_subdir: Some("q4_k_m".to_string()),
        };
        let dst = destination_for(Path::new("/out/repo"), &item);
        assert_eq!(dst, Path::new("/out/repo/q4_k_m/model.bin"));
    }

    #[test]
    fn destination_without_subdir_is_flat() {
        let item = PlanItem {
            path: "config.json".to_string(),
            url: String::new(),
            lfs: false,
            sha256: String::new(),
            sha256_is_real: false,
            size: 1,
            accept_ranges: false,
            filter_subdir: None,
        };
        let dst = destination_for(Path::new("/out/repo"), &item);
        assert_eq!(dst, Path::new("/out/repo/config.json"));
    }
}
