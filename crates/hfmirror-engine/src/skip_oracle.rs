//! Skip oracle: decides whether a plan item's destination can be reused
//! as-is (§4.4). Purely a function of the plan item and filesystem state —
//! no sidecar metadata is written or consulted.

use hfmirror_core::PlanItem;
use std::path::Path;

/// Outcome of consulting the skip oracle for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
    /// Re-download; the destination is missing, absent a size, or known to differ.
    DoNotSkip,
    /// The destination already matches; carries the human-readable reason.
    Skip(&'static str),
}

impl SkipDecision {
    /// Whether this decision means "do not re-download".
    #[must_use]
    pub const fn should_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Evaluate the decision table in §4.4 against `destination`'s current
/// filesystem state and the already-downloaded file's hash, if known.
#[must_use]
pub fn should_skip(item: &PlanItem, destination: &Path, local_sha256: Option<&str>) -> SkipDecision {
    let Ok(metadata) = std::fs::metadata(destination) else {
        return SkipDecision::DoNotSkip;
    };

    let local_size = metadata.len();
    if local_size != item.size {
        return SkipDecision::DoNotSkip;
    }

    if item.lfs && item.sha256_is_real && !item.sha256.is_empty() {
        return match local_sha256 {
            Some(sha) if sha.eq_ignore_ascii_case(&item.sha256) => SkipDecision::Skip("sha256 match"),
            Some(_) => SkipDecision::DoNotSkip,
            None => SkipDecision::DoNotSkip,
        };
    }

    SkipDecision::Skip("size match")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn item(lfs: bool, sha256: &str, size: u64) -> PlanItem {
        PlanItem {
            path: "f.bin".to_string(),
            url: "https://example.com/f.bin".to_string(),
            lfs,
            sha256: sha256.to_string(),
            sha256_is_real: !sha256.is_empty(),
            size,
            accept_ranges: lfs,
            filter_subdir: None,
        }
    }

    #[test]
    fn missing_destination_never_skips() {
        let decision = should_skip(&item(false, "", 10), Path::new("/nonexistent/path/x"), None);
        assert_eq!(decision, SkipDecision::DoNotSkip);
    }

    #[test]
    fn size_mismatch_never_skips() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let decision = should_skip(&item(false, "", 999), f.path(), None);
        assert_eq!(decision, SkipDecision::DoNotSkip);
    }

    #[test]
    fn lfs_with_matching_sha_skips() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let decision = should_skip(&item(true, "ABCDEF", 5), f.path(), Some("abcdef"));
        assert_eq!(decision, SkipDecision::Skip("sha256 match"));
    }

    #[test]
    fn lfs_with_mismatched_sha_does_not_skip() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let decision = should_skip(&item(true, "abcdef", 5), f.path(), Some("000000"));
        assert_eq!(decision, SkipDecision::DoNotSkip);
    }

    #[test]
    fn non_lfs_size_match_skips() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let decision = should_skip(&item(false, "", 5), f.path(), None);
        assert_eq!(decision, SkipDecision::Skip("size match"));
    }

    #[test]
    fn lfs_without_known_sha_falls_back_to_size_match() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let decision = should_skip(&item(true, "", 5), f.path(), None);
        assert_eq!(decision, SkipDecision::Skip("size match"));
    }

    #[test]
    fn lfs_oid_only_falls_back_to_size_match_even_with_digest_in_hand() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        let mut oid_only = item(true, "oid123", 5);
        oid_only.sha256_is_real = false;
        let decision = should_skip(&oid_only, f.path(), Some("000000"));
        assert_eq!(decision, SkipDecision::Skip("size match"));
    }
}
