//! `hfmirror download` - plan and run a mirror, reporting progress to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use hfmirror_core::{EventKind, EventLevel, HttpBackend, ProgressEmitter, ProgressEvent};
use tokio_util::sync::CancellationToken;

use crate::bootstrap::bootstrap;
use crate::parser::RepoArgs;

struct StdoutEmitter;

impl ProgressEmitter for StdoutEmitter {
    fn emit(&self, event: ProgressEvent) {
        match event.kind {
            EventKind::ScanStart => println!("scanning {}@{}", event.repo.unwrap_or_default(), event.revision.unwrap_or_default()),
            EventKind::FileStart => println!("  > {}", event.path.unwrap_or_default()),
            EventKind::FileDone => println!(
                "  {} {}",
                event.path.unwrap_or_default(),
                event.message.as_deref().unwrap_or("done")
            ),
            EventKind::Retry => println!(
                "  retry #{} {}",
                event.attempt.unwrap_or(0),
                event.path.as_deref().unwrap_or_default()
            ),
            EventKind::Error => eprintln!("error: {}", event.message.unwrap_or_default()),
            EventKind::Done => println!("{}", event.message.unwrap_or_else(|| "done".to_string())),
            EventKind::FileProgress | EventKind::PlanItem => {}
        }
        if event.level == EventLevel::Warn {
            eprintln!("warn: {}", event.message.unwrap_or_default());
        }
    }
}

pub async fn execute(repo_args: &RepoArgs, output: PathBuf) -> anyhow::Result<()> {
    let ctx = bootstrap(repo_args, output)?;
    let backend: Arc<dyn HttpBackend> = ctx.backend.clone();
    let emitter: Arc<dyn ProgressEmitter> = Arc::new(StdoutEmitter);
    let cancel = CancellationToken::new();

    hfmirror_engine::orchestrator::run(
        ctx.hub.as_ref(),
        &backend,
        &ctx.job,
        &ctx.settings,
        &emitter,
        &cancel,
    )
    .await?;

    Ok(())
}
