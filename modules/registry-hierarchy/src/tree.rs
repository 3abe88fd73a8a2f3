use std::collections::{HashMap, HashSet};

use registry_common::{Location, RegistryError, Result};
use uuid::Uuid;

/// In-memory index over the location hierarchy.
///
/// Locations reference their parent by id; children are derived here, not
/// stored on the nodes. Every traversal carries a visited set so that a
/// corrupt parent chain (a cycle) surfaces as `CorruptHierarchy` instead
/// of looping.
#[derive(Debug, Clone, Default)]
pub struct LocationTree {
    nodes: HashMap<Uuid, Location>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl LocationTree {
    pub fn from_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let mut nodes: HashMap<Uuid, Location> = HashMap::new();
        for loc in locations {
            nodes.insert(loc.id, loc);
        }

        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for loc in nodes.values() {
            if let Some(parent_id) = loc.parent_id {
                children.entry(parent_id).or_default().push(loc.id);
            }
        }
        // Deterministic child order regardless of map iteration order.
        for ids in children.values_mut() {
            ids.sort_by_key(|id| {
                let name = nodes.get(id).map(|l| l.name.clone()).unwrap_or_default();
                (name, *id)
            });
        }

        Self { nodes, children }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a location, failing with `NotFound` when absent.
    pub fn get(&self, id: Uuid) -> Result<&Location> {
        self.nodes
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound(format!("location {id}")))
    }

    /// The parent of a location, or None for a root. A dangling parent id
    /// (parent deleted out from under the node) is treated as a root.
    pub fn parent_of(&self, id: Uuid) -> Result<Option<&Location>> {
        let node = self.get(id)?;
        Ok(node.parent_id.and_then(|pid| self.nodes.get(&pid)))
    }

    /// Direct children of a location, in stable (name, id) order.
    pub fn children_of(&self, id: Uuid) -> Result<Vec<&Location>> {
        self.get(id)?;
        let ids = self.children.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(ids.iter().filter_map(|cid| self.nodes.get(cid)).collect())
    }

    /// The ancestor chain from `id` (inclusive) up to the root.
    pub fn ancestors_of(&self, id: Uuid) -> Result<Vec<&Location>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(self.get(id)?);

        while let Some(node) = current {
            if !visited.insert(node.id) {
                return Err(RegistryError::CorruptHierarchy(format!(
                    "cycle through location {} while walking up from {id}",
                    node.id
                )));
            }
            chain.push(node);
            current = node.parent_id.and_then(|pid| self.nodes.get(&pid));
        }

        Ok(chain)
    }

    /// All location ids in the subtree rooted at `id`, including `id` itself.
    pub fn descendants_of(&self, id: Uuid) -> Result<HashSet<Uuid>> {
        self.get(id)?;
        let mut seen = HashSet::new();
        let mut queue = vec![id];

        while let Some(current) = queue.pop() {
            if !seen.insert(current) {
                return Err(RegistryError::CorruptHierarchy(format!(
                    "cycle through location {current} while expanding subtree of {id}"
                )));
            }
            if let Some(child_ids) = self.children.get(&current) {
                queue.extend(child_ids.iter().copied());
            }
        }

        Ok(seen)
    }

    /// Every location id in the tree.
    pub fn all_ids(&self) -> HashSet<Uuid> {
        self.nodes.keys().copied().collect()
    }
}
