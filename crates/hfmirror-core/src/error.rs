//! Engine error taxonomy.
//!
//! Designed to be serializable and not depend on external error types like
//! `std::io::Error`. For I/O errors, we capture the kind and message as
//! strings so the error can cross the job-manager / WebSocket boundary
//! unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for tree-walk, planning, download, and verification operations.
///
/// Designed to be serializable across process/API boundaries (HTTP, WS, CLI)
/// without depending on non-serializable types like `std::io::Error`.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum EngineError {
    /// Malformed repository id, missing repo, or other caller mistake.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was invalid.
        message: String,
    },

    /// Hub returned 401; the repository requires a token.
    #[error("unauthorized: accept the agreement at {agreement_url} and provide a token")]
    Unauthorized {
        /// URL where the repository's access agreement can be accepted.
        agreement_url: String,
    },

    /// Hub returned 403; caller has a token but has not accepted terms.
    #[error("forbidden: accept the repository terms at {agreement_url}")]
    Forbidden {
        /// URL where the repository's access agreement can be accepted.
        agreement_url: String,
    },

    /// Repository or revision does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// Hub returned 429.
    #[error("rate limited{}", retry_after.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited {
        /// Seconds to wait before retrying, if the server specified one.
        retry_after: Option<u64>,
    },

    /// Transient 5xx or network-level failure.
    #[error("transient error (status {status:?}): {message}")]
    Transient {
        /// HTTP status code, if the failure came from a response.
        status: Option<u16>,
        /// Detailed error message.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Post-download hash or size mismatch.
    #[error("verification failed: expected {expected}, got {actual}")]
    VerificationFailed {
        /// Expected hash or size.
        expected: String,
        /// Actual hash or size computed.
        actual: String,
    },

    /// The job's context was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Multiple workers failed; this carries the first N errors observed.
    #[error("{} worker error(s); first: {}", errors.len(), errors.first().map_or_else(|| "none".to_string(), ToString::to_string))]
    Aggregate {
        /// Errors collected from concurrent workers.
        errors: Vec<EngineError>,
    },
}

impl EngineError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unauthorized error carrying the repository's agreement URL.
    pub fn unauthorized(agreement_url: impl Into<String>) -> Self {
        Self::Unauthorized {
            agreement_url: agreement_url.into(),
        }
    }

    /// Create a forbidden error carrying the repository's agreement URL.
    pub fn forbidden(agreement_url: impl Into<String>) -> Self {
        Self::Forbidden {
            agreement_url: agreement_url.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a transient error from an HTTP status line.
    pub fn transient(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transient {
            status,
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// Captures the error kind name and message for serialization.
    #[must_use]
    pub fn io(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    /// Create a verification-failed error.
    pub fn verification_failed(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VerificationFailed {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the retry engine should attempt this error again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Transient { .. } | Self::Io { .. }
        )
    }

    /// Whether this error represents a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status code this error should be reported as, for the server surface.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::RateLimited { .. } => 429,
            Self::Transient { .. } | Self::Aggregate { .. } => 502,
            Self::Io { .. } | Self::VerificationFailed { .. } => 500,
            Self::Cancelled => 499,
        }
    }
}

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
