//! The planner: walks a repository tree and turns it into a [`Plan`] (§4.3).

use hfmirror_core::{
    EngineResult, JobRequest, Plan, PlanItem, RepoRef, Settings, TreeNode, TreeNodeKind,
};
use hfmirror_hub::{lfs_resolve_url, raw_file_url};
use std::collections::HashSet;

/// Extensions treated as large artifacts: dropped when no filter matches.
const LARGE_ARTIFACT_EXTENSIONS: &[&str] = &["bin", "act", "safetensors", "zip", "gguf", "ggml"];

/// Walk the repository tree via `hub` and build a [`Plan`] (§4.3, steps 1-8).
pub async fn plan(
    hub: &dyn hfmirror_core::HubClientPort,
    job: &JobRequest,
    settings: &Settings,
) -> EngineResult<Plan> {
    let repo = &job.repo;
    let revision = job.effective_revision();
    let endpoint = settings.endpoint.as_deref().unwrap_or("https://huggingface.co");

    let mut nodes: Vec<TreeNode> = Vec::new();
    {
        let mut visitor: hfmirror_core::ports::TreeVisitor<'_> = &mut |node| {
            nodes.push(node);
            Ok(())
        };
        hub.walk(job, "", &mut visitor).await?;
    }

    let items = build_plan_items(repo, revision, &endpoint.to_string(), nodes, job);
    Ok(Plan { items })
}

fn build_plan_items(
    repo: &RepoRef,
    revision: &str,
    endpoint: &str,
    nodes: Vec<TreeNode>,
    job: &JobRequest,
) -> Vec<PlanItem> {
    // Step 2: dedup by relative path, first occurrence wins.
    let mut seen = HashSet::new();
    let nodes: Vec<TreeNode> = nodes
        .into_iter()
        .filter(|n| matches!(n.kind, TreeNodeKind::File) && seen.insert(n.path.clone()))
        .collect();

    let mut items = Vec::with_capacity(nodes.len());
    for node in nodes {
        if is_excluded(&node.path, &job.excludes) {
            continue;
        }

        let Some((filter_subdir, keep)) = apply_filter_pass(&node, &job.filters) else {
            continue;
        };
        if !keep {
            continue;
        }

        let is_lfs = node.is_lfs();
        let url = if is_lfs {
            lfs_resolve_url(endpoint, repo, revision, &node.path)
        } else {
            raw_file_url(endpoint, repo, revision, &node.path)
        };

        // Step 6: size selection.
        let size = node
            .lfs
            .as_ref()
            .map_or(node.size, |lfs| lfs.size);

        // Step 7: LFS files are assumed to accept range requests.
        let accept_ranges = is_lfs;

        // Step 8: hash selection — top-level sha256, then LFS sha256, then LFS
        // oid. Only the first two are genuine digests; the oid fallback is
        // tracked via `sha256_is_real` so verification never hashes against it.
        let real_sha256 = node.sha256.clone().or_else(|| node.lfs.as_ref().and_then(|l| l.sha256.clone()));
        let (sha256, sha256_is_real) = match real_sha256 {
            Some(hash) => (hash, true),
            None => (node.lfs.as_ref().map_or_else(String::new, |l| l.oid.clone()), false),
        };

        items.push(PlanItem {
            path: node.path,
            url,
            lfs: is_lfs,
            sha256,
            sha256_is_real,
            size,
            accept_ranges,
            filter_subdir,
        });
    }
    items
}

fn is_excluded(path: &str, excludes: &[String]) -> bool {
    let basename = basename_of(path);
    excludes.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        basename.to_ascii_lowercase().contains(&pattern) || path.to_ascii_lowercase().contains(&pattern)
    })
}

/// Step 4: filter pass, LFS files only. Returns `None` to drop, or
/// `Some((subdir, keep))`. The large-artifact drop only applies once
/// filters are configured; with no filters every file is kept.
fn apply_filter_pass(node: &TreeNode, filters: &[String]) -> Option<(Option<String>, bool)> {
    if !node.is_lfs() || filters.is_empty() {
        return Some((None, true));
    }

    let basename = basename_of(&node.path).to_ascii_lowercase();
    let longest_match = filters
        .iter()
        .filter(|f| basename.contains(&f.to_ascii_lowercase()))
        .max_by_key(|f| f.len());

    match longest_match {
        Some(m) => Some((Some(m.clone()), true)),
        None if is_large_artifact(&node.path) => None,
        None => Some((None, true)),
    }
}

fn is_large_artifact(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .is_some_and(|ext| LARGE_ARTIFACT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn basename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfmirror_core::LfsInfo;

    fn lfs_node(path: &str, size: u64) -> TreeNode {
        TreeNode {
            kind: TreeNodeKind::File,
            path: path.to_string(),
            size: 1,
            lfs: Some(LfsInfo {
                oid: "oid123".to_string(),
                size,
                sha256: Some("abc".to_string()),
            }),
            sha256: None,
        }
    }

    fn plain_node(path: &str, size: u64) -> TreeNode {
        TreeNode {
            kind: TreeNodeKind::File,
            path: path.to_string(),
            size,
            lfs: None,
            sha256: None,
        }
    }

    fn job() -> JobRequest {
        JobRequest::new(RepoRef::parse("a/b", false).unwrap())
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![plain_node("readme.md", 10), plain_node("readme.md", 20)];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &job());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].size, 10);
    }

    #[test]
    fn exclude_matches_basename_case_insensitively() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![plain_node("dir/README.md", 10)];
        let mut j = job();
        j.excludes = vec!["readme".to_string()];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &j);
        assert!(items.is_empty());
    }

    #[test]
    fn lfs_large_artifact_dropped_without_matching_filter() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![lfs_node("model.gguf", 9000)];
        let mut j = job();
        j.filters = vec!["q4".to_string()];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &j);
        assert!(items.is_empty());
    }

    #[test]
    fn lfs_large_artifact_kept_when_no_filters_configured() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![lfs_node("model.gguf", 9000)];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &job());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "model.gguf");
    }

    #[test]
    fn lfs_longest_filter_match_wins_subdir() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![lfs_node("model-q4_k_m.gguf", 9000)];
        let mut j = job();
        j.filters = vec!["q4".to_string(), "q4_k_m".to_string()];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &j);
        assert_eq!(items[0].filter_subdir, Some("q4_k_m".to_string()));
    }

    #[test]
    fn lfs_size_uses_lfs_sub_object_not_top_level() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![lfs_node("model.safetensors", 123_456)];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &job());
        assert_eq!(items[0].size, 123_456);
    }

    #[test]
    fn non_lfs_files_are_never_dropped_by_filter_pass() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let nodes = vec![plain_node("config.json", 10)];
        let mut j = job();
        j.filters = vec!["q4".to_string()];
        let items = build_plan_items(&repo, "main", "https://huggingface.co", nodes, &j);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn hash_selection_prefers_top_level_sha_then_lfs_sha_then_oid() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let mut with_top = lfs_node("a.bin", 1);
        with_top.sha256 = Some("top-sha".to_string());
        let items = build_plan_items(&repo, "main", "https://huggingface.co", vec![with_top], &job());
        assert_eq!(items[0].sha256, "top-sha");
        assert!(items[0].sha256_is_real);

        let no_top_sha = lfs_node("b.bin", 1);
        let items = build_plan_items(&repo, "main", "https://huggingface.co", vec![no_top_sha], &job());
        assert_eq!(items[0].sha256, "abc");
        assert!(items[0].sha256_is_real);
    }

    #[test]
    fn hash_selection_falls_back_to_oid_and_marks_it_not_real() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let mut oid_only = lfs_node("c.bin", 1);
        oid_only.lfs.as_mut().unwrap().sha256 = None;
        let items = build_plan_items(&repo, "main", "https://huggingface.co", vec![oid_only], &job());
        assert_eq!(items[0].sha256, "oid123");
        assert!(!items[0].sha256_is_real);
    }
}
