//! Tree-listing JSON parsing (§4.2, §6).
//!
//! The hub's tree endpoint returns a flat JSON array of nodes per directory
//! level: `{type, path, size?, lfs?: {oid, size, sha256?}, sha256?}`. `type`
//! is `"file"` / `"blob"` for a leaf, `"directory"` / `"tree"` for a node the
//! walker recurses into.

use hfmirror_core::{LfsInfo, TreeNode, TreeNodeKind};
use serde_json::Value;

/// Parse one tree-listing response body into its constituent nodes.
///
/// Returns an error message (not an `EngineError`, since the caller attaches
/// its own context such as the prefix being walked) if the body is not a
/// JSON array, or an entry is missing its `path`.
pub fn parse_tree_nodes(body: &[u8]) -> Result<Vec<TreeNode>, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let array = value.as_array().ok_or("expected a JSON array of tree nodes")?;
    array.iter().map(parse_tree_node).collect()
}

fn parse_tree_node(node: &Value) -> Result<TreeNode, String> {
    let path = node
        .get("path")
        .and_then(Value::as_str)
        .ok_or("tree node missing \"path\"")?
        .to_string();

    let kind = match node.get("type").and_then(Value::as_str) {
        Some("directory" | "tree") => TreeNodeKind::Directory,
        _ => TreeNodeKind::File,
    };

    let size = node.get("size").and_then(Value::as_u64).unwrap_or(0);

    let lfs = node.get("lfs").and_then(parse_lfs_info);

    let sha256 = node
        .get("sha256")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(TreeNode {
        kind,
        path,
        size,
        lfs,
        sha256,
    })
}

fn parse_lfs_info(lfs: &Value) -> Option<LfsInfo> {
    let oid = lfs.get("oid").and_then(Value::as_str)?.to_string();
    let size = lfs.get("size").and_then(Value::as_u64).unwrap_or(0);
    let sha256 = lfs
        .get("sha256")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(LfsInfo { oid, size, sha256 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_file_and_directory_nodes() {
        let body = serde_json::to_vec(&json!([
            {"path": "README.md", "type": "file", "size": 1200},
            {"path": "data", "type": "directory", "size": 0},
            {"path": "model.safetensors", "type": "file", "size": 9000,
             "lfs": {"oid": "abc123", "size": 9_000_000_000u64, "sha256": "deadbeef"}}
        ]))
        .unwrap();

        let nodes = parse_tree_nodes(&body).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[0].kind, TreeNodeKind::File));
        assert!(matches!(nodes[1].kind, TreeNodeKind::Directory));
        assert!(nodes[2].is_lfs());
        assert_eq!(nodes[2].lfs.as_ref().unwrap().size, 9_000_000_000);
    }

    #[test]
    fn tree_type_alias_recurses_like_directory() {
        let body = serde_json::to_vec(&json!([{"path": "subdir", "type": "tree"}])).unwrap();
        let nodes = parse_tree_nodes(&body).unwrap();
        assert!(matches!(nodes[0].kind, TreeNodeKind::Directory));
    }

    #[test]
    fn blob_type_is_treated_as_file() {
        let body = serde_json::to_vec(&json!([{"path": "weights.bin", "type": "blob", "size": 42}])).unwrap();
        let nodes = parse_tree_nodes(&body).unwrap();
        assert!(matches!(nodes[0].kind, TreeNodeKind::File));
    }

    #[test]
    fn missing_lfs_sha256_is_none() {
        let body = serde_json::to_vec(&json!([
            {"path": "f.bin", "type": "file", "lfs": {"oid": "x", "size": 10}}
        ]))
        .unwrap();
        let nodes = parse_tree_nodes(&body).unwrap();
        assert_eq!(nodes[0].lfs.as_ref().unwrap().sha256, None);
    }

    #[test]
    fn non_array_body_is_an_error() {
        let body = serde_json::to_vec(&json!({"not": "an array"})).unwrap();
        assert!(parse_tree_nodes(&body).is_err());
    }

    #[test]
    fn node_missing_path_is_an_error() {
        let body = serde_json::to_vec(&json!([{"type": "file", "size": 1}])).unwrap();
        assert!(parse_tree_nodes(&body).is_err());
    }
}
