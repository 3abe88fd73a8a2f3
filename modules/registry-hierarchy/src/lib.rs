//! Location hierarchy: the in-memory tree index, role-based access
//! scoping, and the pruned subtree projection served to clients.

pub mod projector;
pub mod scope;
pub mod tree;

pub use projector::{project, project_for_user, LocationSubtree};
pub use scope::{resolve_accessible, scope_root, AccessScope};
pub use tree::LocationTree;
