use std::collections::HashSet;

use registry_common::{LocationKind, RegistryError, Result, Role};
use tracing::debug;
use uuid::Uuid;

use crate::tree::LocationTree;

/// The resolved access scope for one request: the adjusted root plus the
/// full set of location ids the caller may see.
#[derive(Debug, Clone)]
pub struct AccessScope {
    pub root: Uuid,
    pub location_ids: HashSet<Uuid>,
}

/// Derive the scope root for a user from their roles and home location.
///
/// This is the whole authorization decision table in one place. The roles
/// are mutually exclusive in the domain, so membership checks are ordered
/// from widest to narrowest:
/// - admin: the top of the home location's ancestor chain.
/// - county user: climb facility -> subcounty -> county as far as the
///   ancestor chain allows (a facility with no county above its subcounty
///   stops at the subcounty; known coarse-grained fallback), or one level
///   up from a subcounty home.
/// - subcounty / facility-incharge user: one level up from a facility home.
/// - anything else: the home location itself (least privilege).
pub fn scope_root(tree: &LocationTree, roles: &[Role], home_id: Uuid) -> Result<Uuid> {
    let home = tree.get(home_id)?;

    if roles.contains(&Role::Admin) {
        let chain = tree.ancestors_of(home_id)?;
        // ancestors_of never returns an empty chain
        return Ok(chain.last().map(|l| l.id).unwrap_or(home_id));
    }

    if roles.contains(&Role::CountyUser) {
        let root = match home.kind {
            LocationKind::Facility => {
                let parent = tree.parent_of(home_id)?;
                match parent {
                    Some(subcounty) => tree
                        .parent_of(subcounty.id)?
                        .map(|county| county.id)
                        .unwrap_or(subcounty.id),
                    None => home_id,
                }
            }
            LocationKind::Subcounty => tree
                .parent_of(home_id)?
                .map(|county| county.id)
                .unwrap_or(home_id),
            _ => home_id,
        };
        return Ok(root);
    }

    if roles.contains(&Role::SubcountyUser) || roles.contains(&Role::FacilityIncharge) {
        if home.kind == LocationKind::Facility {
            if let Some(parent) = tree.parent_of(home_id)? {
                return Ok(parent.id);
            }
        }
        return Ok(home_id);
    }

    Ok(home_id)
}

/// Resolve the full accessible location set for a request.
///
/// Non-admin callers naming a `requested` location outside their resolved
/// scope get `Forbidden`, never a silently narrowed result. When a
/// requested location is in scope (or the caller is admin), the scope is
/// anchored there: the accessible set is that subtree, not the whole
/// resolved scope.
pub fn resolve_accessible(
    tree: &LocationTree,
    roles: &[Role],
    home_id: Uuid,
    requested: Option<Uuid>,
) -> Result<AccessScope> {
    if roles.contains(&Role::Admin) {
        let scope = match requested {
            Some(req) => AccessScope {
                root: req,
                location_ids: tree.descendants_of(req)?,
            },
            None => AccessScope {
                root: scope_root(tree, roles, home_id)?,
                location_ids: tree.all_ids(),
            },
        };
        debug!(root = %scope.root, size = scope.location_ids.len(), "resolved admin scope");
        return Ok(scope);
    }

    let root = scope_root(tree, roles, home_id)?;
    let accessible = tree.descendants_of(root)?;

    let scope = match requested {
        Some(req) => {
            tree.get(req)?;
            if !accessible.contains(&req) {
                return Err(RegistryError::Forbidden(format!(
                    "location {req} is outside the caller's scope"
                )));
            }
            AccessScope {
                root: req,
                location_ids: tree.descendants_of(req)?,
            }
        }
        None => AccessScope {
            root,
            location_ids: accessible,
        },
    };

    debug!(root = %scope.root, size = scope.location_ids.len(), "resolved scope");
    Ok(scope)
}
