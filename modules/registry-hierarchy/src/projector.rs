use std::collections::HashSet;

use registry_common::{LocationKind, RegistryError, Result, Role};
use serde::Serialize;
use uuid::Uuid;

use crate::scope::scope_root;
use crate::tree::LocationTree;

/// Pruned nested view of a subtree, the only location shape clients see.
/// The projected root's `parent_id` is always None: ancestors above the
/// root are not part of the projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSubtree {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub parent_id: Option<Uuid>,
    pub children: Vec<LocationSubtree>,
}

/// Render the subtree rooted at `root_id`. Fails with `NotFound` for an
/// unknown root and `CorruptHierarchy` if the child graph loops.
pub fn project(tree: &LocationTree, root_id: Uuid) -> Result<LocationSubtree> {
    let mut visited = HashSet::new();
    build(tree, root_id, None, &mut visited)
}

/// Render the browsable subtree for a user: apply the role scope-root
/// adjustment to the home location first, then project from there.
pub fn project_for_user(
    tree: &LocationTree,
    roles: &[Role],
    home_id: Uuid,
) -> Result<LocationSubtree> {
    let root = scope_root(tree, roles, home_id)?;
    project(tree, root)
}

fn build(
    tree: &LocationTree,
    id: Uuid,
    parent_id: Option<Uuid>,
    visited: &mut HashSet<Uuid>,
) -> Result<LocationSubtree> {
    if !visited.insert(id) {
        return Err(RegistryError::CorruptHierarchy(format!(
            "cycle through location {id} while projecting subtree"
        )));
    }

    let node = tree.get(id)?;
    let mut children = Vec::new();
    for child in tree.children_of(id)? {
        children.push(build(tree, child.id, Some(id), visited)?);
    }

    Ok(LocationSubtree {
        id,
        name: node.name.clone(),
        kind: node.kind,
        parent_id,
        children,
    })
}
