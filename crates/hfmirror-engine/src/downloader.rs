//! The file downloader: single-request and multipart-with-resume strategies
//! (§4.5), driven by the retry engine (§4.6).

use crate::common::{auth_headers, now_ms};
use crate::retry::{sleep_cancellable, Backoff};
use hfmirror_core::{
    EngineError, EngineResult, EventKind, EventLevel, HttpBackend, PlanItem, ProgressEmitter,
    ProgressEvent, Settings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Download `item` to `destination`, choosing single-request or multipart
/// based on size and range-support (§4.5's strategy selection).
pub async fn download(
    backend: &Arc<dyn HttpBackend>,
    item: &PlanItem,
    destination: &Path,
    settings: &Settings,
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    let headers = auth_headers(settings);

    if item.size >= settings.multipart_threshold_bytes && item.accept_ranges {
        return download_multipart(backend, item, destination, settings, &headers, emitter, cancel).await;
    }

    download_single(backend, item, destination, settings, &headers, emitter, cancel).await
}

async fn download_single(
    backend: &Arc<dyn HttpBackend>,
    item: &PlanItem,
    destination: &Path,
    settings: &Settings,
    headers: &[(String, String)],
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    let part_path = part_path(destination);
    let mut backoff = Backoff::from_settings(settings);

    loop {
        match attempt_single(backend, item, &part_path, headers, emitter, cancel).await {
            Ok(()) => {
                tokio::fs::rename(&part_path, destination)
                    .await
                    .map_err(|e| EngineError::io(&e))?;
                return Ok(());
            }
            Err(e) if e.is_retryable() && backoff.has_attempts_left() => {
                emitter.emit(
                    ProgressEvent::new(now_ms(), EventLevel::Warn, EventKind::Retry)
                        .with_path(item.path.clone())
                        .with_message(e.to_string()),
                );
                let delay = backoff.next_delay();
                if !sleep_cancellable(cancel, delay).await {
                    return Err(EngineError::Cancelled);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

async fn attempt_single(
    backend: &Arc<dyn HttpBackend>,
    item: &PlanItem,
    part_path: &Path,
    headers: &[(String, String)],
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    let resp = backend.get(&item.url, headers).await?;
    if !(200..300).contains(&resp.status) {
        return Err(EngineError::transient(
            Some(resp.status),
            format!("GET {} returned {}", item.url, resp.status),
        ));
    }

    let mut file = tokio::fs::File::create(part_path).await.map_err(|e| EngineError::io(&e))?;
    file.write_all(&resp.body).await.map_err(|e| EngineError::io(&e))?;
    file.flush().await.map_err(|e| EngineError::io(&e))?;

    #[allow(clippy::cast_possible_truncation)]
    let downloaded = resp.body.len() as u64;
    emitter.emit(
        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::FileProgress)
            .with_path(item.path.clone())
            .with_bytes(downloaded, item.size),
    );
    Ok(())
}

async fn download_multipart(
    backend: &Arc<dyn HttpBackend>,
    item: &PlanItem,
    destination: &Path,
    settings: &Settings,
    headers: &[(String, String)],
    emitter: &Arc<dyn ProgressEmitter>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    let size = if item.size > 0 {
        item.size
    } else {
        let head = backend.head(&item.url, headers).await?;
        head.header("content-length").and_then(|v| v.parse::<u64>().ok()).unwrap_or(0)
    };
    if size == 0 {
        // Edge case (§4.5): multipart requires a known length.
        return download_single(backend, item, destination, settings, headers, emitter, cancel).await;
    }

    let concurrency = settings.connections.max(1);
    let ranges = partition_ranges(size, concurrency);
    let part_paths: Vec<PathBuf> = (0..ranges.len()).map(|i| part_n_path(destination, i)).collect();

    let progress_handle = spawn_progress_ticker(
        part_paths.clone(),
        item.path.clone(),
        size,
        Arc::clone(emitter),
        cancel.clone(),
    );

    let mut handles = Vec::with_capacity(ranges.len());
    for (idx, (start, end)) in ranges.into_iter().enumerate() {
        let part_path = part_paths[idx].clone();
        let url = item.url.clone();
        let headers = headers.to_vec();
        let settings = settings.clone();
        let cancel = cancel.clone();
        let backend = Arc::clone(backend);
        handles.push(tokio::spawn(async move {
            download_part(&backend, &url, &headers, start, end, &part_path, &settings, &cancel).await
        }));
    }

    // §4.8's "best-effort": every part runs to completion regardless of a
    // sibling's failure; only the first error observed is surfaced.
    let mut first_error = None;
    for handle in handles {
        match handle.await {
            Ok(Err(e)) if first_error.is_none() => first_error = Some(e),
            _ => {}
        }
    }

    progress_handle.abort();

    if let Some(e) = first_error {
        return Err(e);
    }

    assemble_parts(&part_paths, destination).await
}

async fn download_part(
    backend: &Arc<dyn HttpBackend>,
    url: &str,
    headers: &[(String, String)],
    start: u64,
    end: u64,
    part_path: &Path,
    settings: &Settings,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    let range_len = end - start + 1;
    if let Ok(metadata) = tokio::fs::metadata(part_path).await {
        if metadata.len() == range_len {
            return Ok(());
        }
    }

    let mut backoff = Backoff::from_settings(settings);
    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match backend.get_range(url, headers, start, end).await {
            Ok(resp) if resp.status == 206 => {
                let mut file = tokio::fs::File::create(part_path).await.map_err(|e| EngineError::io(&e))?;
                file.write_all(&resp.body).await.map_err(|e| EngineError::io(&e))?;
                file.flush().await.map_err(|e| EngineError::io(&e))?;
                return Ok(());
            }
            Ok(resp) => {
                let err = EngineError::transient(Some(resp.status), format!("range request returned {}", resp.status));
                if !backoff.has_attempts_left() {
                    return Err(err);
                }
                let delay = backoff.next_delay();
                if !sleep_cancellable(cancel, delay).await {
                    return Err(EngineError::Cancelled);
                }
            }
            Err(e) if e.is_retryable() && backoff.has_attempts_left() => {
                let delay = backoff.next_delay();
                if !sleep_cancellable(cancel, delay).await {
                    return Err(EngineError::Cancelled);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn partition_ranges(size: u64, concurrency: u32) -> Vec<(u64, u64)> {
    let n = u64::from(concurrency).min(size.max(1));
    let chunk = size / n;
    let mut ranges = Vec::with_capacity(n as usize);
    let mut start = 0;
    for i in 0..n {
        let end = if i == n - 1 { size - 1 } else { start + chunk - 1 };
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

async fn assemble_parts(part_paths: &[PathBuf], destination: &Path) -> EngineResult<()> {
    let assembly_path = part_path(destination);
    {
        let mut out = tokio::fs::File::create(&assembly_path).await.map_err(|e| EngineError::io(&e))?;
        for part in part_paths {
            let bytes = tokio::fs::read(part).await.map_err(|e| EngineError::io(&e))?;
            out.write_all(&bytes).await.map_err(|e| EngineError::io(&e))?;
        }
        out.flush().await.map_err(|e| EngineError::io(&e))?;
    }
    tokio::fs::rename(&assembly_path, destination).await.map_err(|e| EngineError::io(&e))?;
    for part in part_paths {
        let _ = tokio::fs::remove_file(part).await;
    }
    Ok(())
}

fn spawn_progress_ticker(
    part_paths: Vec<PathBuf>,
    path: String,
    total: u64,
    emitter: Arc<dyn ProgressEmitter>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PROGRESS_INTERVAL);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let downloaded: u64 = part_paths
                        .iter()
                        .map(|p| std::fs::metadata(p).map(|m| m.len()).unwrap_or(0))
                        .sum();
                    emitter.emit(
                        ProgressEvent::new(now_ms(), EventLevel::Info, EventKind::FileProgress)
                            .with_path(path.clone())
                            .with_bytes(downloaded, total),
                    );
                }
            }
        }
    })
}

fn part_path(destination: &Path) -> PathBuf {
    let mut s = destination.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

fn part_n_path(destination: &Path, index: usize) -> PathBuf {
    let mut s = destination.as_os_str().to_owned();
    s.push(format!(".part-{index:02}"));
    PathBuf::from(s)
}
