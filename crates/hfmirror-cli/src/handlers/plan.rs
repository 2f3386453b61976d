//! `hfmirror plan` - dry run: print the plan without downloading.

use crate::bootstrap::bootstrap;
use crate::parser::RepoArgs;

pub async fn execute(repo_args: &RepoArgs, as_json: bool) -> anyhow::Result<()> {
    let ctx = bootstrap(repo_args, std::env::current_dir()?)?;
    let plan = hfmirror_engine::planner::plan(ctx.hub.as_ref(), &ctx.job, &ctx.settings).await?;

    if as_json {
        let files: Vec<_> = plan
            .items
            .iter()
            .map(|item| serde_json::json!({"path": item.path, "size": item.size, "lfs": item.lfs}))
            .collect();
        let body = serde_json::json!({
            "repo": ctx.job.repo.to_string(),
            "revision": ctx.job.effective_revision(),
            "files": files,
            "totalSize": plan.total_size(),
            "totalFiles": plan.items.len(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}@{}", ctx.job.repo, ctx.job.effective_revision());
    for item in &plan.items {
        let marker = if item.lfs { "lfs" } else { "   " };
        println!("  {marker}  {:>12}  {}", item.size, item.path);
    }
    println!(
        "{} files, {} bytes total",
        plan.items.len(),
        plan.total_size()
    );

    Ok(())
}
