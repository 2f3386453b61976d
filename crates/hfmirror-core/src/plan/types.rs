//! Core domain types for the tree walk, planner, and job requests.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository reference in `owner/name` form, plus whether it is a
/// dataset (as opposed to a model) repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Repository owner or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Whether this is a dataset repository (affects the API path used).
    pub is_dataset: bool,
}

impl RepoRef {
    /// Parse an `owner/name` string into a repo reference.
    ///
    /// Returns `None` if the string does not contain exactly one `/`
    /// separating two non-empty segments.
    #[must_use]
    pub fn parse(repo: &str, is_dataset: bool) -> Option<Self> {
        let mut parts = repo.splitn(2, '/');
        let owner = parts.next()?;
        let name = parts.next()?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            is_dataset,
        })
    }

    /// The dedup key used by the job manager: `(owner, name, is_dataset)`.
    #[must_use]
    pub fn dedup_key(&self) -> (String, bool) {
        (format!("{}/{}", self.owner, self.name), self.is_dataset)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The request unit: what repository to mirror and how to filter it.
///
/// Invariant: `repo.owner` and `repo.name` are both non-empty (enforced by
/// [`RepoRef::parse`]); if `revision` is empty, it defaults to `"main"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Repository to mirror.
    pub repo: RepoRef,
    /// Branch, tag, or commit SHA.
    pub revision: String,
    /// Case-insensitive substrings; when non-empty, only LFS files whose
    /// basename matches one of these are kept.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Case-insensitive substrings; any file whose basename or full path
    /// matches one of these is dropped.
    #[serde(default)]
    pub excludes: Vec<String>,
    /// When true, files matched by a filter are placed under a subdirectory
    /// named after the longest matching filter.
    #[serde(default)]
    pub append_filter_subdir: bool,
}

impl JobRequest {
    /// Create a job request for the default revision (`"main"`) with no
    /// filters or excludes.
    #[must_use]
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            revision: "main".to_string(),
            filters: Vec::new(),
            excludes: Vec::new(),
            append_filter_subdir: false,
        }
    }

    /// Resolve the effective revision, defaulting an empty string to `"main"`.
    #[must_use]
    pub fn effective_revision(&self) -> &str {
        if self.revision.is_empty() {
            "main"
        } else {
            &self.revision
        }
    }
}

/// What kind of node the tree API reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeNodeKind {
    /// A leaf file (plain or LFS).
    File,
    /// A directory to be recursed into.
    Directory,
}

/// LFS metadata attached to a file node, when the file is LFS-tracked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfsInfo {
    /// The LFS object id (sha256 of the blob, used as storage key).
    pub oid: String,
    /// Size of the blob, authoritative over the node's top-level size.
    pub size: u64,
    /// SHA-256 of the blob, if the API reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// A single node yielded by the tree-listing API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Node kind: file or directory.
    pub kind: TreeNodeKind,
    /// Path relative to the repository root.
    pub path: String,
    /// Declared size in bytes (size of the pointer file for LFS entries).
    pub size: u64,
    /// LFS metadata, present only for LFS-tracked files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs: Option<LfsInfo>,
    /// Top-level SHA-256, if the API reported one directly on the node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl TreeNode {
    /// Whether this node is LFS-tracked.
    #[must_use]
    pub const fn is_lfs(&self) -> bool {
        self.lfs.is_some()
    }
}

/// One file to consider for download, after planning.
///
/// Invariant: every item has a unique relative path within a [`Plan`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Path relative to the repository root.
    pub path: String,
    /// Fully resolved URL to fetch the file content from.
    pub url: String,
    /// Whether this is an LFS-tracked file.
    pub lfs: bool,
    /// Known SHA-256, if any (empty string when unknown).
    ///
    /// May hold an LFS object id rather than a genuine digest when no real
    /// hash was reported; see `sha256_is_real`.
    #[serde(default)]
    pub sha256: String,
    /// Whether `sha256` is a genuine SHA-256 digest, as opposed to an LFS
    /// object id carried over as a fallback.
    #[serde(default)]
    pub sha256_is_real: bool,
    /// Declared size in bytes (authoritative; see planner step 6).
    pub size: u64,
    /// Whether range requests are permitted for this item.
    pub accept_ranges: bool,
    /// Subdirectory this file was routed to because it matched a filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_subdir: Option<String>,
}

/// An ordered, immutable sequence of plan items produced atomically by the
/// planner from a single tree walk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Items in discovery order.
    pub items: Vec<PlanItem>,
}

impl Plan {
    /// Total declared size across all items, in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_ref_parses_owner_and_name() {
        let repo = RepoRef::parse("unsloth/Llama-3", false).unwrap();
        assert_eq!(repo.owner, "unsloth");
        assert_eq!(repo.name, "Llama-3");
        assert_eq!(repo.to_string(), "unsloth/Llama-3");
    }

    #[test]
    fn repo_ref_rejects_malformed_input() {
        assert!(RepoRef::parse("no-slash", false).is_none());
        assert!(RepoRef::parse("/missing-owner", false).is_none());
        assert!(RepoRef::parse("owner/", false).is_none());
        assert!(RepoRef::parse("owner/name/extra", false).is_none());
    }

    #[test]
    fn job_request_defaults_empty_revision_to_main() {
        let repo = RepoRef::parse("a/b", false).unwrap();
        let mut req = JobRequest::new(repo);
        req.revision = String::new();
        assert_eq!(req.effective_revision(), "main");
    }

    #[test]
    fn dedup_key_distinguishes_dataset_flag() {
        let model = RepoRef::parse("a/b", false).unwrap();
        let dataset = RepoRef::parse("a/b", true).unwrap();
        assert_ne!(model.dedup_key(), dataset.dedup_key());
    }

    #[test]
    fn plan_total_size_sums_items() {
        let plan = Plan {
            items: vec![
                PlanItem {
                    path: "a".into(),
                    url: "http://x/a".into(),
                    lfs: false,
                    sha256: String::new(),
                    size: 10,
                    accept_ranges: false,
                    filter_subdir: None,
                },
                PlanItem {
                    path: "b".into(),
                    url: "http://x/b".into(),
                    lfs: true,
                    sha256: "deadbeef".into(),
                    size: 20,
                    accept_ranges: true,
                    filter_subdir: None,
                },
            ],
        };
        assert_eq!(plan.total_size(), 30);
    }
}
