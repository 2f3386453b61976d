//! CLI bootstrap - the composition root.
//!
//! This is the only place where the CLI wires the hub client and HTTP
//! backend together; handlers receive already-built values.

use std::path::PathBuf;
use std::sync::Arc;

use hfmirror_core::{JobRequest, RepoRef, Settings};
use hfmirror_hub::{build_client, normalize_endpoint, HubClient, ReqwestBackend};

use crate::parser::RepoArgs;

/// Build the hub client, HTTP backend, settings, and parsed job request for
/// one `download`/`plan` invocation.
pub struct Context {
    pub hub: Arc<HubClient<ReqwestBackend>>,
    pub backend: Arc<ReqwestBackend>,
    pub settings: Settings,
    pub job: JobRequest,
}

/// Resolve `RepoArgs` plus an output root into a ready-to-use [`Context`].
pub fn bootstrap(args: &RepoArgs, output_root: PathBuf) -> anyhow::Result<Context> {
    let repo = RepoRef::parse(&args.repo, args.dataset)
        .ok_or_else(|| anyhow::anyhow!("malformed repository id: {}", args.repo))?;

    let mut job = JobRequest::new(repo);
    job.revision = args.revision.clone();
    job.filters = args.filters.clone();
    job.excludes = args.excludes.clone();
    job.append_filter_subdir = args.append_filter_subdir;

    let mut builder = Settings::builder(output_root);
    if let Some(token) = &args.token {
        builder = builder.token(token.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    let settings = builder.build();

    let client = build_client();
    let backend = Arc::new(ReqwestBackend::new(client));
    let endpoint = normalize_endpoint(settings.endpoint.as_deref());
    let hub = Arc::new(HubClient::new(Arc::clone(&backend), endpoint, settings.token.clone()));

    Ok(Context { hub, backend, settings, job })
}
