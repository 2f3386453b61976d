//! Progress bus event types (§4.9).
//!
//! A single discriminated union carries every event kind the engine emits.
//! Consumers dispatch on `kind`; callbacks are invoked from many workers
//! concurrently, so consumers must tolerate reentrant calls.

use serde::{Deserialize, Serialize};

/// Severity of a progress event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Routine informational event.
    Info,
    /// Recoverable condition worth surfacing (e.g. a retry).
    Warn,
    /// An operation failed.
    Error,
    /// Fine-grained diagnostic detail.
    Debug,
}

/// Discriminates the kind of progress event, per the §4.9 event table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A tree walk / plan build has started for a job.
    ScanStart,
    /// A plan item was produced by the planner.
    PlanItem,
    /// A file download has started.
    FileStart,
    /// A file download made progress.
    FileProgress,
    /// A file download finished (downloaded, skipped, or failed).
    FileDone,
    /// A retry was scheduled for an HTTP operation.
    Retry,
    /// An unrecoverable error occurred.
    Error,
    /// The job finished successfully.
    Done,
}

/// A single progress event, as described by §3's "Progress Event" entity.
///
/// Consumers dispatch on `kind`; not every field is populated for every
/// kind (see the required-fields table in §4.9).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Unix epoch milliseconds when the event was produced.
    pub timestamp_ms: u64,
    /// Severity of this event.
    pub level: EventLevel,
    /// Which kind of event this is.
    pub kind: EventKind,
    /// Repository this event pertains to, e.g. `"owner/name"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Revision this event pertains to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// File path relative to the repository root, if this event is file-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Bytes transferred so far for the current operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_bytes: Option<u64>,
    /// Total bytes expected for the current operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Cumulative bytes downloaded across the whole job so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_bytes: Option<u64>,
    /// Retry attempt number, for `retry` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Free-form human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the file this event pertains to is LFS-tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_lfs: Option<bool>,
}

impl ProgressEvent {
    /// Start building an event of the given kind at the given timestamp.
    ///
    /// Timestamps are supplied by the caller (never read from the clock
    /// internally) so that engine code stays free of direct `SystemTime`
    /// calls at the point of emission.
    #[must_use]
    pub const fn new(timestamp_ms: u64, level: EventLevel, kind: EventKind) -> Self {
        Self {
            timestamp_ms,
            level,
            kind,
            repo: None,
            revision: None,
            path: None,
            current_bytes: None,
            total_bytes: None,
            cumulative_bytes: None,
            attempt: None,
            message: None,
            is_lfs: None,
        }
    }

    /// Attach the repo/revision pair.
    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>, revision: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self.revision = Some(revision.into());
        self
    }

    /// Attach a file path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a free-form message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach byte counters.
    #[must_use]
    pub const fn with_bytes(mut self, current: u64, total: u64) -> Self {
        self.current_bytes = Some(current);
        self.total_bytes = Some(total);
        self
    }

    /// Attach the LFS flag.
    #[must_use]
    pub const fn with_is_lfs(mut self, is_lfs: bool) -> Self {
        self.is_lfs = Some(is_lfs);
        self
    }

    /// Attach a retry attempt number.
    #[must_use]
    pub const fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_requested_fields() {
        let event = ProgressEvent::new(1_000, EventLevel::Info, EventKind::FileProgress)
            .with_path("model.safetensors")
            .with_bytes(512, 1024)
            .with_is_lfs(true);

        assert_eq!(event.path.as_deref(), Some("model.safetensors"));
        assert_eq!(event.current_bytes, Some(512));
        assert_eq!(event.total_bytes, Some(1024));
        assert_eq!(event.is_lfs, Some(true));
    }

    #[test]
    fn serializes_with_type_tag_free_layout() {
        let event = ProgressEvent::new(0, EventLevel::Error, EventKind::Error)
            .with_message("boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "boom");
    }
}
