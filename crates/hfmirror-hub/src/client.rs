//! The hub client: tree walking and range-capability probing (§4.2).

use crate::parsing::parse_tree_nodes;
use crate::url::{agreement_url, tree_url};
use async_trait::async_trait;
use hfmirror_core::{
    EngineError, EngineResult, HttpBackend, HubClientPort, JobRequest, RepoRef, TreeVisitor,
};
use std::sync::Arc;
use std::time::Duration;

/// Concrete [`HubClientPort`] backed by an [`HttpBackend`].
///
/// Generic over the backend so tests can swap in
/// [`crate::http::testing::FakeBackend`] without touching the network.
pub struct HubClient<B: HttpBackend> {
    backend: Arc<B>,
    endpoint: String,
    token: Option<String>,
}

impl<B: HttpBackend> HubClient<B> {
    /// Build a client against `endpoint` (already normalized), authenticating
    /// with `token` when present.
    pub fn new(backend: Arc<B>, endpoint: String, token: Option<String>) -> Self {
        Self {
            backend,
            endpoint,
            token,
        }
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        crate::http::add_auth(self.token.as_deref())
    }

    async fn fetch_level(&self, repo: &RepoRef, revision: &str, prefix: &str) -> EngineResult<Vec<u8>> {
        let url = tree_url(&self.endpoint, repo, revision, prefix);
        let resp = self.backend.get(&url, &self.auth_headers()).await?;
        match resp.status {
            200 => Ok(resp.body),
            401 => Err(EngineError::unauthorized(agreement_url(&self.endpoint, repo))),
            403 => Err(EngineError::forbidden(agreement_url(&self.endpoint, repo))),
            status => Err(EngineError::Transient {
                status: Some(status),
                message: format!("{status} {url}"),
            }),
        }
    }
}

#[async_trait]
impl<B: HttpBackend + Send + Sync> HubClientPort for HubClient<B> {
    async fn walk(&self, job: &JobRequest, prefix: &str, visitor: &mut TreeVisitor<'_>) -> EngineResult<()> {
        self.walk_prefix(&job.repo, job.effective_revision(), prefix, visitor).await
    }

    async fn quick_head_accept_ranges(&self, url: &str) -> (bool, bool) {
        let headers = self.auth_headers();
        let result = tokio::time::timeout(Duration::from_secs(5), self.backend.head(url, &headers)).await;
        match result {
            Ok(Ok(resp)) => {
                let accepts_ranges = resp
                    .header("accept-ranges")
                    .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));
                (resp.status < 400, accepts_ranges)
            }
            _ => (false, false),
        }
    }
}

impl<B: HttpBackend + Send + Sync> HubClient<B> {
    fn walk_prefix<'a>(
        &'a self,
        repo: &'a RepoRef,
        revision: &'a str,
        prefix: &'a str,
        visitor: &'a mut TreeVisitor<'_>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = EngineResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.fetch_level(repo, revision, prefix).await?;
            let nodes = parse_tree_nodes(&body)
                .map_err(|message| EngineError::Transient { status: None, message })?;

            for node in nodes {
                match node.kind {
                    hfmirror_core::TreeNodeKind::Directory => {
                        self.walk_prefix(repo, revision, &node.path, visitor).await?;
                    }
                    hfmirror_core::TreeNodeKind::File => {
                        visitor(node)?;
                    }
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use serde_json::json;

    fn job() -> JobRequest {
        JobRequest::new(RepoRef::parse("a/b", false).unwrap())
    }

    #[tokio::test]
    async fn walks_nested_directories_in_discovery_order() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_response(
                    "/tree/main",
                    CannedResponse::json(&json!([
                        {"path": "README.md", "type": "file", "size": 10},
                        {"path": "data", "type": "directory"}
                    ])),
                )
                .with_response(
                    "/tree/main/data",
                    CannedResponse::json(&json!([{"path": "data/weights.bin", "type": "file", "size": 99}])),
                ),
        );
        let client = HubClient::new(backend, "https://huggingface.co".to_string(), None);

        let mut paths = Vec::new();
        let mut visitor: TreeVisitor<'_> = &mut |node| {
            paths.push(node.path);
            Ok(())
        };
        client.walk(&job(), "", &mut visitor).await.unwrap();

        assert_eq!(paths, vec!["README.md".to_string(), "data/weights.bin".to_string()]);
    }

    #[tokio::test]
    async fn unauthorized_error_includes_agreement_url() {
        let backend = Arc::new(FakeBackend::new().with_response("/tree/main", CannedResponse::status(401)));
        let client = HubClient::new(backend, "https://huggingface.co".to_string(), None);

        let mut visitor: TreeVisitor<'_> = &mut |_node| Ok(());
        let err = client.walk(&job(), "", &mut visitor).await.unwrap_err();
        match err {
            EngineError::Unauthorized { agreement_url } => {
                assert_eq!(agreement_url, "https://huggingface.co/a/b");
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_error_includes_agreement_url() {
        let backend = Arc::new(FakeBackend::new().with_response("/tree/main", CannedResponse::status(403)));
        let client = HubClient::new(backend, "https://huggingface.co".to_string(), None);

        let mut visitor: TreeVisitor<'_> = &mut |_node| Ok(());
        let err = client.walk(&job(), "", &mut visitor).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn visitor_error_aborts_the_walk() {
        let backend = Arc::new(
            FakeBackend::new().with_response(
                "/tree/main",
                CannedResponse::json(&json!([
                    {"path": "a.bin", "type": "file", "size": 1},
                    {"path": "b.bin", "type": "file", "size": 1}
                ])),
            ),
        );
        let client = HubClient::new(backend, "https://huggingface.co".to_string(), None);

        let mut seen = 0;
        let mut visitor: TreeVisitor<'_> = &mut |_node| {
            seen += 1;
            Err(EngineError::invalid_argument("stop"))
        };
        let err = client.walk(&job(), "", &mut visitor).await;
        assert!(err.is_err());
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn quick_head_reports_accept_ranges_header() {
        let mut headers = std::collections::HashMap::new();
        headers.insert("accept-ranges".to_string(), "bytes".to_string());
        let backend = Arc::new(FakeBackend::new().with_response(
            "resolve",
            CannedResponse {
                status: 200,
                headers,
                body: Vec::new(),
            },
        ));
        let client = HubClient::new(backend, "https://huggingface.co".to_string(), None);

        let (reachable, accepts_ranges) = client
            .quick_head_accept_ranges("https://huggingface.co/a/b/resolve/main/f.bin")
            .await;
        assert!(reachable);
        assert!(accepts_ranges);
    }
}
