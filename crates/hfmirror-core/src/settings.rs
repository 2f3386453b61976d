//! Engine configuration.
//!
//! These are pure domain types with no infrastructure dependencies. Built
//! via an explicit builder; the engine never reads process-global state
//! (see DESIGN.md's note on global-state elimination).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-file parallel connection count for multipart downloads.
pub const DEFAULT_CONNECTIONS: u32 = 8;

/// Default multipart threshold.
pub const DEFAULT_MULTIPART_THRESHOLD_BYTES: u64 = 32 * 1024 * 1024;

/// Default retry count.
pub const DEFAULT_RETRIES: u32 = 4;

/// Default initial backoff.
pub const DEFAULT_BACKOFF_INITIAL: Duration = Duration::from_millis(400);

/// Default maximum backoff.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// How a downloaded file's integrity is checked before it is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// No verification beyond the download completing.
    None,
    /// Compare on-disk size to the plan item's declared size.
    #[default]
    Size,
    /// Compare the server ETag to a locally cached value.
    ///
    /// No persistent ETag store exists in this implementation; the verifier
    /// treats this identically to `Size` (see DESIGN.md).
    Etag,
    /// Hash the file and compare to the known SHA-256.
    Sha256,
}

/// Engine configuration.
///
/// All tunables are explicit fields with sensible defaults, constructed via
/// `Settings::builder()`. The engine never consults environment variables
/// or other process-global state directly; callers (CLI, server bootstrap)
/// are responsible for resolving those into a `Settings` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory under which repositories are mirrored.
    pub output_root: PathBuf,
    /// Per-file parallel connection count for multipart downloads.
    pub connections: u32,
    /// Maximum number of files downloading concurrently.
    pub max_active: u32,
    /// Files at or above this size use the multipart strategy.
    pub multipart_threshold_bytes: u64,
    /// Integrity check performed after each file download.
    pub verify_mode: VerifyMode,
    /// Maximum number of retry attempts per HTTP operation.
    pub retries: u32,
    /// Initial backoff delay before the first retry.
    pub backoff_initial: Duration,
    /// Maximum backoff delay, after exponential growth.
    pub backoff_max: Duration,
    /// Access token for private/gated repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Override for the hub endpoint, e.g. for a mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Settings {
    /// Start building settings rooted at the given output directory.
    #[must_use]
    pub fn builder(output_root: impl Into<PathBuf>) -> SettingsBuilder {
        SettingsBuilder::new(output_root)
    }

    /// Token masked for API responses (`Settings` serialized to callers must
    /// never leak the raw token).
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| "****".to_string()),
            ..self.clone()
        }
    }
}

/// Builder for [`Settings`], mirroring the explicit-builder idiom used
/// elsewhere in this codebase rather than a global/static configuration.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    output_root: PathBuf,
    connections: u32,
    max_active: u32,
    multipart_threshold_bytes: u64,
    verify_mode: VerifyMode,
    retries: u32,
    backoff_initial: Duration,
    backoff_max: Duration,
    token: Option<String>,
    endpoint: Option<String>,
}

impl SettingsBuilder {
    /// Create a new builder with defaults, rooted at `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            connections: DEFAULT_CONNECTIONS,
            max_active: num_cpus::get() as u32,
            multipart_threshold_bytes: DEFAULT_MULTIPART_THRESHOLD_BYTES,
            verify_mode: VerifyMode::default(),
            retries: DEFAULT_RETRIES,
            backoff_initial: DEFAULT_BACKOFF_INITIAL,
            backoff_max: DEFAULT_BACKOFF_MAX,
            token: None,
            endpoint: None,
        }
    }

    /// Set the per-file connection count.
    #[must_use]
    pub const fn connections(mut self, connections: u32) -> Self {
        self.connections = connections;
        self
    }

    /// Set the maximum number of concurrently-active file downloads.
    #[must_use]
    pub const fn max_active(mut self, max_active: u32) -> Self {
        self.max_active = max_active;
        self
    }

    /// Set the multipart threshold in bytes.
    #[must_use]
    pub const fn multipart_threshold_bytes(mut self, bytes: u64) -> Self {
        self.multipart_threshold_bytes = bytes;
        self
    }

    /// Set the verify mode.
    #[must_use]
    pub const fn verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }

    /// Set the retry count.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the initial and maximum backoff durations.
    #[must_use]
    pub const fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff_initial = initial;
        self.backoff_max = max;
        self
    }

    /// Set the access token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set an endpoint override.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Finalize the settings.
    #[must_use]
    pub fn build(self) -> Settings {
        Settings {
            output_root: self.output_root,
            connections: self.connections,
            max_active: self.max_active,
            multipart_threshold_bytes: self.multipart_threshold_bytes,
            verify_mode: self.verify_mode,
            retries: self.retries,
            backoff_initial: self.backoff_initial,
            backoff_max: self.backoff_max,
            token: self.token,
            endpoint: self.endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let settings = Settings::builder("/tmp/out").build();
        assert_eq!(settings.connections, DEFAULT_CONNECTIONS);
        assert_eq!(settings.retries, DEFAULT_RETRIES);
        assert_eq!(settings.verify_mode, VerifyMode::Size);
    }

    #[test]
    fn masked_settings_hide_token() {
        let settings = Settings::builder("/tmp/out").token("secret-value").build();
        let masked = settings.masked();
        assert_eq!(masked.token.as_deref(), Some("****"));
        assert_eq!(settings.token.as_deref(), Some("secret-value"));
    }
}
