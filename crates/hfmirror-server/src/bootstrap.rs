//! Server bootstrap - the composition root.
//!
//! This module is the only place where the hub client, HTTP backend, and
//! job manager are wired together.

use std::sync::Arc;

use hfmirror_core::Settings;
use hfmirror_engine::JobManager;
use hfmirror_hub::{build_client, normalize_endpoint, HubClient, ReqwestBackend};
use tokio::sync::RwLock;

/// CORS configuration for the HTTP server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration: the listen port, CORS policy, and the initial
/// engine [`Settings`] (output root, concurrency, retry policy, token).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Initial engine settings. Mutable afterward via `POST /api/settings`,
    /// except `output_root` which is never taken from a request.
    pub settings: Settings,
}

impl ServerConfig {
    /// Create config with default settings rooted at `output_root`.
    #[must_use]
    pub fn with_defaults(output_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            port: 8080,
            cors: CorsConfig::default(),
            settings: Settings::builder(output_root).build(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Concrete job manager type this server wires up: a hub client and HTTP
/// backend both backed by the shared [`ReqwestBackend`].
pub type ServerJobManager = JobManager<HubClient<ReqwestBackend>, ReqwestBackend>;

/// Application context holding every shared service a handler may need.
pub struct AppContext {
    /// Job creation, lookup, cancellation, and progress fan-out.
    pub job_manager: Arc<ServerJobManager>,
    /// Live engine settings, shared with the job manager so token/concurrency
    /// changes apply to jobs started after the change.
    pub settings: Arc<RwLock<Settings>>,
    /// Hub client, used directly by the `/api/plan` dry-run handler.
    pub hub: Arc<HubClient<ReqwestBackend>>,
}

/// Bootstrap the server context: build the shared HTTP client, the hub
/// client, and the job manager.
///
/// The hub client's token is resolved once, from `config.settings` at
/// bootstrap time; a later `POST /api/settings` token change applies to
/// file downloads (which read settings per-job) but not to tree walks
/// issued through this `hub` handle (see DESIGN.md).
#[must_use]
pub fn bootstrap(config: ServerConfig) -> AppContext {
    let client = build_client();
    let backend = Arc::new(ReqwestBackend::new(client));

    let endpoint = normalize_endpoint(config.settings.endpoint.as_deref());
    let hub = Arc::new(HubClient::new(
        Arc::clone(&backend),
        endpoint,
        config.settings.token.clone(),
    ));

    let settings = Arc::new(RwLock::new(config.settings));
    let job_manager = Arc::new(JobManager::new(
        Arc::clone(&hub),
        backend,
        Arc::clone(&settings),
    ));

    AppContext {
        job_manager,
        settings,
        hub,
    }
}

/// Start the HTTP server on `config.port`, serving until the process is
/// signalled to stop.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let port = config.port;
    let cors = config.cors.clone();
    let ctx = bootstrap(config);

    let app = crate::routes::create_router(Arc::new(ctx), &cors);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(target: "hfmirror.server", %addr, "hfmirror server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
