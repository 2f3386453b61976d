//! Hub client port: tree-walk and low-level HTTP abstractions.
//!
//! The core domain depends only on this trait; the concrete implementation
//! (building URLs, parsing tree JSON, issuing requests) lives in the hub
//! client crate. Tests substitute a fake backend keyed by URL substring.

use crate::error::EngineResult;
use crate::plan::{JobRequest, TreeNode};
use async_trait::async_trait;
use std::collections::HashMap;

/// Callback invoked once per file node discovered by [`HubClientPort::walk`].
///
/// Returning an error aborts the walk; the error is propagated to the
/// caller of `walk`.
pub type TreeVisitor<'a> = dyn FnMut(TreeNode) -> EngineResult<()> + Send + 'a;

/// Port for interacting with the hub's tree-listing and range-probe APIs
/// (§4.1, §4.2).
#[async_trait]
pub trait HubClientPort: Send + Sync {
    /// Recursively walk the repository tree starting at `prefix`, invoking
    /// `visitor` once per file node. Directory nodes are recursed into to
    /// arbitrary depth.
    async fn walk(
        &self,
        job: &JobRequest,
        prefix: &str,
        visitor: &mut TreeVisitor<'_>,
    ) -> EngineResult<()>;

    /// Probe whether `url` is reachable and accepts byte-range requests,
    /// using a short bounded timeout. Never fails the caller; unreachable
    /// or ambiguous results are reported as `(false, false)`.
    async fn quick_head_accept_ranges(&self, url: &str) -> (bool, bool);
}

/// A generic HTTP response, abstracted away from any particular HTTP
/// client crate so it can be produced by a fake backend in tests.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased keys.
    pub headers: HashMap<String, String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Look up a header by lower-case name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Low-level HTTP operations needed by the downloader and tree walker.
///
/// Implementations must attach auth headers themselves via
/// [`HttpBackend::get`]/[`HttpBackend::get_range`]'s `headers` parameter;
/// this port does not know about tokens.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Issue a `GET` request.
    async fn get(&self, url: &str, headers: &[(String, String)]) -> EngineResult<HttpResponse>;

    /// Issue a `GET` request with a `Range: bytes=start-end` header.
    async fn get_range(
        &self,
        url: &str,
        headers: &[(String, String)],
        start: u64,
        end: u64,
    ) -> EngineResult<HttpResponse>;

    /// Issue a `HEAD` request.
    async fn head(&self, url: &str, headers: &[(String, String)]) -> EngineResult<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_object_safe(_: Arc<dyn HubClientPort>) {}
    fn _assert_http_backend_object_safe(_: Arc<dyn HttpBackend>) {}

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), "42".to_string());
        let resp = HttpResponse {
            status: 200,
            headers,
            body: Vec::new(),
        };
        assert_eq!(resp.header("Content-Length"), Some("42"));
        assert_eq!(resp.header("content-length"), Some("42"));
        assert_eq!(resp.header("missing"), None);
    }
}
