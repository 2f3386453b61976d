//! Core domain types and port definitions for the download engine.
//!
//! This crate holds pure data types (no I/O, no networking) plus the trait
//! definitions ("ports") that the engine depends on. Concrete adapters
//! (the hub HTTP client, the filesystem downloader) live in sibling crates.

#![deny(unused_crate_dependencies)]

pub mod error;
pub mod job;
pub mod plan;
pub mod ports;
pub mod settings;

pub use error::{EngineError, EngineResult};
pub use job::{
    EventKind, EventLevel, FileProgress, FileStatus, JobProgress, JobStatus, ProgressEvent,
};
pub use plan::{JobRequest, LfsInfo, Plan, PlanItem, RepoRef, TreeNode, TreeNodeKind};
pub use ports::{
    HttpBackend, HttpResponse, HubClientPort, NoopEventEmitter, ProgressEmitter, TreeVisitor,
};
pub use settings::{Settings, SettingsBuilder, VerifyMode};

// Silence unused dev-dependency warnings until the integration suite grows.
#[cfg(test)]
use tokio_test as _;
