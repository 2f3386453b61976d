//! Thin CLI composition root exercising the download engine directly (§6.1).
//!
//! CLI flag parsing and the terminal renderer are intentionally minimal:
//! this crate wires `clap` straight into the engine and hub crates, with no
//! feature surface of its own beyond dispatch.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used only by main.rs (bin target), not the lib target.
use dotenvy as _;
use tokio as _;
use tracing as _;
use tracing_subscriber as _;

// Reserved for integration-style tests exercising bootstrap() against a
// scratch directory.
#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod handlers;
pub mod parser;

pub use parser::{Cli, Commands, RepoArgs};
