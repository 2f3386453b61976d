//! URL construction helpers for the hub API (§4.1, §6).
//!
//! # Invariants
//!
//! The repository path segment (`owner/name`) is **not** percent-encoded —
//! the hub requires the literal slash between owner and name. Every other
//! path segment (revision, file path components) is percent-encoded
//! individually, then joined by literal slashes. Changing this breaks the
//! hub's routing (see DESIGN.md's note on path encoding).

use hfmirror_core::RepoRef;

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Normalize an endpoint override, stripping any trailing slash, or fall
/// back to the public hub.
#[must_use]
pub fn normalize_endpoint(endpoint: Option<&str>) -> String {
    endpoint
        .map(|e| e.trim_end_matches('/').to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// Percent-encode a single path segment (everything except the literal
/// owner/name slash), operating on raw UTF-8 bytes so non-ASCII segments
/// are encoded correctly.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Percent-encode every `/`-delimited component of `path` individually,
/// then rejoin with literal slashes.
fn encode_path(path: &str) -> String {
    path.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}

fn repo_kind_segment(repo: &RepoRef) -> &'static str {
    if repo.is_dataset { "datasets" } else { "models" }
}

/// Build the tree-listing URL for `prefix` (empty string lists the root).
#[must_use]
pub fn tree_url(endpoint: &str, repo: &RepoRef, revision: &str, prefix: &str) -> String {
    let endpoint = normalize_endpoint(Some(endpoint));
    let revision_enc = encode_segment(revision);
    let mut url = format!(
        "{endpoint}/api/{}/{repo}/tree/{revision_enc}",
        repo_kind_segment(repo)
    );
    if !prefix.is_empty() {
        url.push('/');
        url.push_str(&encode_path(prefix));
    }
    url
}

/// Build the raw-file URL for a non-LFS file.
#[must_use]
pub fn raw_file_url(endpoint: &str, repo: &RepoRef, revision: &str, path: &str) -> String {
    let endpoint = normalize_endpoint(Some(endpoint));
    let revision_enc = encode_segment(revision);
    let dataset_segment = if repo.is_dataset { "/datasets" } else { "" };
    format!(
        "{endpoint}{dataset_segment}/{repo}/raw/{revision_enc}/{}",
        encode_path(path)
    )
}

/// Build the LFS resolve URL for an LFS-tracked file. The hub may respond
/// with a `302` to object storage; the HTTP client follows redirects.
#[must_use]
pub fn lfs_resolve_url(endpoint: &str, repo: &RepoRef, revision: &str, path: &str) -> String {
    let endpoint = normalize_endpoint(Some(endpoint));
    let revision_enc = encode_segment(revision);
    let dataset_segment = if repo.is_dataset { "/datasets" } else { "" };
    format!(
        "{endpoint}{dataset_segment}/{repo}/resolve/{revision_enc}/{}",
        encode_path(path)
    )
}

/// Build the URL for the repository's access-agreement page.
#[must_use]
pub fn agreement_url(endpoint: &str, repo: &RepoRef) -> String {
    let endpoint = normalize_endpoint(Some(endpoint));
    format!("{endpoint}/{repo}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef::parse("a/b", false).unwrap()
    }

    #[test]
    fn owner_name_slash_is_not_encoded() {
        let url = tree_url("https://huggingface.co", &repo(), "main", "");
        assert_eq!(
            url,
            "https://huggingface.co/api/models/a/b/tree/main"
        );
    }

    #[test]
    fn dataset_repo_uses_datasets_segment() {
        let dataset = RepoRef::parse("a/b", true).unwrap();
        let url = tree_url("https://huggingface.co", &dataset, "main", "");
        assert!(url.contains("/api/datasets/a/b/tree/main"));

        let raw = raw_file_url("https://huggingface.co", &dataset, "main", "file.txt");
        assert!(raw.contains("/datasets/a/b/raw/main/file.txt"));
    }

    #[test]
    fn path_segments_are_percent_encoded_individually() {
        let url = raw_file_url("https://huggingface.co", &repo(), "main", "dir with space/file#1.bin");
        assert!(url.contains("dir%20with%20space/file%231.bin"));
    }

    #[test]
    fn endpoint_trailing_slash_is_stripped() {
        let url = tree_url("https://huggingface.co/", &repo(), "main", "");
        assert!(!url.contains("//api"));
    }

    #[test]
    fn agreement_url_points_at_repo_page() {
        assert_eq!(
            agreement_url("https://huggingface.co", &repo()),
            "https://huggingface.co/a/b"
        );
    }

    #[test]
    fn lfs_resolve_url_uses_resolve_segment() {
        let url = lfs_resolve_url("https://huggingface.co", &repo(), "v1.0", "model.bin");
        assert_eq!(
            url,
            "https://huggingface.co/a/b/resolve/v1.0/model.bin"
        );
    }
}
