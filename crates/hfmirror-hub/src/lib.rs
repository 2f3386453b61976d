//! Hub HTTP client: URL construction, transport, tree-JSON parsing, and the
//! [`HubClientPort`](hfmirror_core::HubClientPort) implementation that walks
//! a repository's file tree (§4.1, §4.2).

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod client;
pub mod http;
mod parsing;
mod url;

pub use client::HubClient;
pub use http::{add_auth, build_client, ReqwestBackend};
pub use url::{agreement_url, lfs_resolve_url, normalize_endpoint, raw_file_url, tree_url};

// Silence unused dev-dependency warning until the integration suite grows.
#[cfg(test)]
use tokio_test as _;
