//! Plan domain types.
//!
//! Pure data types produced by the tree walker and planner. No I/O,
//! networking, or runtime dependencies allowed.

mod types;

pub use types::{JobRequest, LfsInfo, Plan, PlanItem, RepoRef, TreeNode, TreeNodeKind};
