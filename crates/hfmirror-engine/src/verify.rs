//! Post-download verification (§4.7). The commit step (temp file rename
//! into place) only happens after this succeeds.

use hfmirror_core::{EngineError, EngineResult, HttpBackend, PlanItem, VerifyMode};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Verify a downloaded file against its plan item, per the configured mode.
///
/// - LFS files with a known *genuine* SHA-256 are always hashed, regardless
///   of `mode`. When the planner only had an LFS object id to fall back on
///   (`sha256_is_real` is false), that id is not a content digest and hashing
///   against it would raise a spurious failure, so verification falls
///   through to `mode` instead.
/// - Otherwise `mode` governs: `size` stats the file; `sha256` HEADs the URL
///   for an `x-amz-meta-sha256` header and hashes only if present; `etag`
///   degrades to `size` (no persistent ETag store); `none` never fails.
pub async fn verify(
    path: &Path,
    item: &PlanItem,
    mode: VerifyMode,
    backend: &dyn HttpBackend,
) -> EngineResult<()> {
    if item.lfs && item.sha256_is_real && !item.sha256.is_empty() {
        return verify_sha256(path, &item.sha256).await;
    }

    match mode {
        VerifyMode::None => Ok(()),
        VerifyMode::Size | VerifyMode::Etag => verify_size(path, item.size),
        VerifyMode::Sha256 => verify_sha256_if_header_present(path, item, backend).await,
    }
}

fn verify_size(path: &Path, expected: u64) -> EngineResult<()> {
    if expected == 0 {
        return Ok(());
    }
    let actual = std::fs::metadata(path).map_err(|e| EngineError::io(&e))?.len();
    if actual == expected {
        Ok(())
    } else {
        Err(EngineError::verification_failed(expected.to_string(), actual.to_string()))
    }
}

async fn verify_sha256(path: &Path, expected: &str) -> EngineResult<()> {
    let bytes = tokio::fs::read(path).await.map_err(|e| EngineError::io(&e))?;
    let actual = hex::encode(Sha256::digest(&bytes));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(EngineError::verification_failed(expected.to_string(), actual))
    }
}

async fn verify_sha256_if_header_present(
    path: &Path,
    item: &PlanItem,
    backend: &dyn HttpBackend,
) -> EngineResult<()> {
    let resp = backend.head(&item.url, &[]).await?;
    let Some(expected) = resp.header("x-amz-meta-sha256") else {
        return Ok(());
    };
    verify_sha256(path, expected).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfmirror_core::HttpResponse;
    use std::collections::HashMap;

    struct NoopBackend;

    #[async_trait::async_trait]
    impl HttpBackend for NoopBackend {
        async fn get(&self, _url: &str, _headers: &[(String, String)]) -> EngineResult<HttpResponse> {
            unreachable!()
        }
        async fn get_range(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _start: u64,
            _end: u64,
        ) -> EngineResult<HttpResponse> {
            unreachable!()
        }
        async fn head(&self, _url: &str, _headers: &[(String, String)]) -> EngineResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Vec::new(),
            })
        }
    }

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

    #[tokio::test]
    async fn size_mode_passes_on_matching_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();
        let result = verify(&path, &item(false, "", 5), VerifyMode::Size, &NoopBackend).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn size_mode_fails_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();
        let result = verify(&path, &item(false, "", 999), VerifyMode::Size, &NoopBackend).await;
        assert!(matches!(result, Err(EngineError::VerificationFailed { .. })));
    }

    #[tokio::test]
    async fn lfs_sha256_is_always_checked_regardless_of_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();
        let expected = hex::encode(Sha256::digest(b"hello"));
        let result = verify(&path, &item(true, &expected, 5), VerifyMode::None, &NoopBackend).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn lfs_oid_only_falls_through_to_mode_instead_of_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();
        let mut oid_only = item(true, "oid123", 5);
        oid_only.sha256_is_real = false;
        let result = verify(&path, &oid_only, VerifyMode::Size, &NoopBackend).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn none_mode_never_fails_non_lfs_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();
        let result = verify(&path, &item(false, "", 999), VerifyMode::None, &NoopBackend).await;
        assert!(result.is_ok());
    }
}
