//! Containment graph between flattened roles
//!
//! A role B *contains* a role A when B requires every group A requires and
//! at least one more. B is then the more specific role: anybody holding B
//! also holds A, so B is placed beneath A in the hierarchy.
//!
//! The graph is built in two phases:
//! 1. Reject roles with identical requirements (they would contain each other)
//! 2. Record every containing pair densely (all pairs, not only direct ones)
//!
//! [`reduce`] then keeps only the direct edges.

use crate::error::{Result, RoleError};
use crate::types::{contains_groups, BackendGroups, FlattenedRole, GroupRoles, RoleId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// True when `outer` requires everything `inner` requires, and more
pub fn strictly_contains(outer: &BackendGroups, inner: &BackendGroups) -> bool {
    contains_groups(outer, inner) && !contains_groups(inner, outer)
}

/// Reject distinct roles whose effective requirements are identical
///
/// Identical requirements are the only way two roles can contain each other.
pub fn check_ambiguity(flat: &BTreeMap<RoleId, FlattenedRole>) -> Result<()> {
    let mut seen: BTreeMap<&BackendGroups, &RoleId> = BTreeMap::new();

    for (id, role) in flat {
        if let Some(first) = seen.insert(&role.backends_groups, id) {
            return Err(RoleError::AmbiguousRoleContent {
                first: first.clone(),
                second: id.clone(),
            });
        }
    }

    Ok(())
}

/// Dense containment relation plus the group indexes derived alongside it
#[derive(Debug, Clone, Default)]
pub struct ContainmentGraph {
    /// role -> roles whose requirements strictly include it (its descendants)
    supersets: BTreeMap<RoleId, BTreeSet<RoleId>>,

    /// role -> roles whose requirements it strictly includes (its ancestors)
    subsets: BTreeMap<RoleId, BTreeSet<RoleId>>,

    /// Every backend referenced by some role
    backends: BTreeSet<String>,

    /// backend -> group -> roles referencing it
    group_roles: GroupRoles,
}

impl ContainmentGraph {
    /// Build the dense containment graph of a flattened role table
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousRoleContent` if two roles have identical requirements.
    pub fn build(flat: &BTreeMap<RoleId, FlattenedRole>) -> Result<Self> {
        check_ambiguity(flat)?;

        let mut graph = Self::default();

        for (id, role) in flat {
            graph.supersets.insert(id.clone(), BTreeSet::new());
            graph.subsets.insert(id.clone(), BTreeSet::new());

            for (backend, groups) in &role.backends_groups {
                graph.backends.insert(backend.clone());
                let index = graph.group_roles.entry(backend.clone()).or_default();
                for group in groups {
                    index.entry(group.clone()).or_default().insert(id.clone());
                }
            }
        }

        for (inner_id, inner) in flat {
            for (outer_id, outer) in flat {
                if inner_id == outer_id
                    || !strictly_contains(&outer.backends_groups, &inner.backends_groups)
                {
                    continue;
                }

                if let Some(set) = graph.supersets.get_mut(inner_id) {
                    set.insert(outer_id.clone());
                }
                if let Some(set) = graph.subsets.get_mut(outer_id) {
                    set.insert(inner_id.clone());
                }
            }
        }

        debug!(
            roles = flat.len(),
            edges = graph.edge_count(),
            backends = graph.backends.len(),
            "Built dense containment graph"
        );

        Ok(graph)
    }

    /// True when `descendant` strictly contains `ancestor`
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.supersets
            .get(ancestor)
            .map_or(false, |set| set.contains(descendant))
    }

    /// Dense relation: role -> every role beneath it
    pub fn supersets(&self) -> &BTreeMap<RoleId, BTreeSet<RoleId>> {
        &self.supersets
    }

    /// Dense relation: role -> every role above it
    pub fn subsets(&self) -> &BTreeMap<RoleId, BTreeSet<RoleId>> {
        &self.subsets
    }

    /// Roles nothing else is contained in: the tops of the forest
    pub fn roots(&self) -> BTreeSet<RoleId> {
        self.subsets
            .iter()
            .filter(|(_, above)| above.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn backends(&self) -> &BTreeSet<String> {
        &self.backends
    }

    pub fn group_roles(&self) -> &GroupRoles {
        &self.group_roles
    }

    /// Number of dense containment edges
    pub fn edge_count(&self) -> usize {
        self.supersets.values().map(BTreeSet::len).sum()
    }
}

/// Transitive reduction of a transitively closed relation
///
/// For each role, a related role is kept only if it is not also related
/// through another related role. The result depends only on the input
/// relation, not on iteration order, and its transitive closure is the input.
pub fn reduce(edges: &BTreeMap<RoleId, BTreeSet<RoleId>>) -> BTreeMap<RoleId, BTreeSet<RoleId>> {
    edges
        .iter()
        .map(|(id, related)| {
            let direct = related
                .iter()
                .filter(|candidate| {
                    !related.iter().any(|via| {
                        via != *candidate
                            && edges.get(via).map_or(false, |next| next.contains(*candidate))
                    })
                })
                .cloned()
                .collect();
            (id.clone(), direct)
        })
        .collect()
}
