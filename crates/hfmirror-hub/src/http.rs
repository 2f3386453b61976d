//! HTTP backend abstraction for the hub client (§4.1).
//!
//! Production code talks to the hub through [`ReqwestBackend`]; tests
//! substitute [`testing::FakeBackend`], keyed by URL substring, so that
//! planner/skip-oracle/downloader logic can be exercised without a network.

use async_trait::async_trait;
use hfmirror_core::error::EngineError;
use hfmirror_core::ports::{HttpBackend, HttpResponse};
use std::time::Duration;

const USER_AGENT: &str = concat!("hfmirror/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client: a bounded idle-connection pool, a short
/// TLS-handshake timeout, and system-proxy awareness (reqwest honors
/// `HTTP_PROXY`/`HTTPS_PROXY` by default).
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(64)
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to construct HTTP client")
}

/// Attach `Authorization: Bearer <token>` when `token` is non-empty.
fn auth_headers(token: Option<&str>) -> Vec<(String, String)> {
    match token {
        Some(t) if !t.is_empty() => vec![("Authorization".to_string(), format!("Bearer {t}"))],
        _ => Vec::new(),
    }
}

async fn response_to_http_response(resp: reqwest::Response) -> Result<HttpResponse, EngineError> {
    let status = resp.status().as_u16();
    let headers = resp
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    let body = resp
        .bytes()
        .await
        .map_err(|e| EngineError::transient(None, e.to_string()))?
        .to_vec();
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn map_reqwest_err(err: &reqwest::Error) -> EngineError {
    if err.is_timeout() || err.is_connect() {
        EngineError::transient(None, err.to_string())
    } else {
        EngineError::Io {
            kind: "Network".to_string(),
            message: err.to_string(),
        }
    }
}

/// Production HTTP backend.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Wrap a shared [`reqwest::Client`].
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, EngineError> {
        let mut req = self.client.get(url);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let resp = req.send().await.map_err(|e| map_reqwest_err(&e))?;
        response_to_http_response(resp).await
    }

    async fn get_range(
        &self,
        url: &str,
        headers: &[(String, String)],
        start: u64,
        end: u64,
    ) -> Result<HttpResponse, EngineError> {
        let mut req = self
            .client
            .get(url)
            .header("Range", format!("bytes={start}-{end}"));
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let resp = req.send().await.map_err(|e| map_reqwest_err(&e))?;
        response_to_http_response(resp).await
    }

    async fn head(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, EngineError> {
        let mut req = self.client.head(url);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let resp = req.send().await.map_err(|e| map_reqwest_err(&e))?;
        response_to_http_response(resp).await
    }
}

/// Build the headers `add-auth` attaches: bearer token (if any) plus the
/// stable `User-Agent` identifier. The user agent is already set at the
/// client level via [`build_client`]; this exists for callers that need
/// just the auth header list (e.g. range requests issued outside a shared
/// client, or fakes in tests).
#[must_use]
pub fn add_auth(token: Option<&str>) -> Vec<(String, String)> {
    auth_headers(token)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A canned response keyed by URL substring.
    #[derive(Clone)]
    pub struct CannedResponse {
        /// Status code to return.
        pub status: u16,
        /// Headers to return, lower-cased keys.
        pub headers: HashMap<String, String>,
        /// Body bytes to return.
        pub body: Vec<u8>,
    }

    impl CannedResponse {
        /// A `200 OK` JSON body.
        #[must_use]
        pub fn json(value: &serde_json::Value) -> Self {
            Self {
                status: 200,
                headers: HashMap::new(),
                body: serde_json::to_vec(value).unwrap(),
            }
        }

        /// A bare status response with an empty body.
        #[must_use]
        pub fn status(status: u16) -> Self {
            Self {
                status,
                headers: HashMap::new(),
                body: Vec::new(),
            }
        }
    }

    /// A fake HTTP backend keyed by URL substring.
    pub struct FakeBackend {
        responses: Mutex<Vec<(String, CannedResponse)>>,
    }

    impl FakeBackend {
        /// Create an empty fake backend.
        #[must_use]
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
            }
        }

        /// Register a canned response for any URL containing `pattern`.
        #[must_use]
        pub fn with_response(self, pattern: impl Into<String>, response: CannedResponse) -> Self {
            self.responses.lock().unwrap().push((pattern.into(), response));
            self
        }

        fn find(&self, url: &str) -> Option<CannedResponse> {
            self.responses
                .lock()
                .unwrap()
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()))
                .map(|(_, resp)| resp.clone())
        }
    }

    impl Default for FakeBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<HttpResponse, EngineError> {
            self.find(url)
                .map(|r| HttpResponse {
                    status: r.status,
                    headers: r.headers,
                    body: r.body,
                })
                .ok_or_else(|| EngineError::not_found(format!("no canned response for {url}")))
        }

        async fn get_range(
            &self,
            url: &str,
            headers: &[(String, String)],
            _start: u64,
            _end: u64,
        ) -> Result<HttpResponse, EngineError> {
            self.get(url, headers).await
        }

        async fn head(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, EngineError> {
            self.get(url, headers).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_token_means_no_auth_header() {
        assert!(add_auth(None).is_empty());
        assert!(add_auth(Some("")).is_empty());
    }

    #[test]
    fn token_produces_bearer_header() {
        let headers = add_auth(Some("abc123"));
        assert_eq!(headers, vec![("Authorization".to_string(), "Bearer abc123".to_string())]);
    }
}
