//! Server-mode job lifecycle types (§4.10).
//!
//! These are the serializable pieces of the "Job (server mode)" entity:
//! the status, the aggregate and per-file progress snapshots. The full
//! `Job` record (which also owns a cancellation handle) is assembled by
//! the job manager, since the handle itself is not serializable.

use serde::{Deserialize, Serialize};

/// Status of a server-mode job.
///
/// State machine: `queued -> running -> { completed | failed | cancelled }`.
/// `cancelled` may be entered from `queued` or `running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker slot.
    Queued,
    /// Actively downloading.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before or during execution.
    Cancelled,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions expected).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Status of an individual file within a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Planned but not yet started.
    Pending,
    /// Currently downloading.
    Downloading,
    /// Skipped because the local copy already matches.
    Skipped,
    /// Downloaded and verified.
    Done,
    /// Failed after exhausting retries.
    Failed,
}

/// Progress snapshot for a single file within a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileProgress {
    /// Path relative to the repository root.
    pub path: String,
    /// Current status of this file.
    pub status: FileStatus,
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Declared total size in bytes.
    pub total: u64,
}

impl FileProgress {
    /// Create a new pending file-progress entry.
    #[must_use]
    pub const fn new(path: String, total: u64) -> Self {
        Self {
            path,
            status: FileStatus::Pending,
            downloaded: 0,
            total,
        }
    }
}

/// Aggregate progress across every file in a job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Total number of files in the plan.
    pub total_files: u32,
    /// Number of files that have finished (downloaded or skipped).
    pub completed_files: u32,
    /// Total declared bytes across the plan.
    pub total_bytes: u64,
    /// Cumulative bytes downloaded so far.
    pub downloaded_bytes: u64,
    /// Current aggregate throughput in bytes/sec.
    pub bytes_per_sec: f64,
}

impl JobProgress {
    /// Fraction complete in `[0.0, 1.0]`, or `0.0` if the total is unknown.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            #[expect(
                clippy::cast_precision_loss,
                reason = "progress fractions tolerate precision loss at this scale"
            )]
            let fraction = self.downloaded_bytes as f64 / self.total_bytes as f64;
            fraction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn fraction_handles_zero_total() {
        let progress = JobProgress::default();
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn fraction_computes_ratio() {
        let progress = JobProgress {
            total_files: 2,
            completed_files: 1,
            total_bytes: 1000,
            downloaded_bytes: 250,
            bytes_per_sec: 100.0,
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
    }
}
