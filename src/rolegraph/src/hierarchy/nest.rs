//! Nested view construction from reduced edges

use crate::types::{FlattenedRole, NestedRole, RoleId};
use std::collections::{BTreeMap, BTreeSet};

/// Build a nested role for each id in `top_level`
///
/// `direct` maps each role to its direct subroles (the reduced relation).
/// A role reachable through two direct edges is copied under both. Passing
/// every role id gives the full export view; passing only the roots gives
/// the bare forest.
pub fn nest(
    direct: &BTreeMap<RoleId, BTreeSet<RoleId>>,
    flat: &BTreeMap<RoleId, FlattenedRole>,
    top_level: &BTreeSet<RoleId>,
) -> BTreeMap<RoleId, NestedRole> {
    top_level
        .iter()
        .filter_map(|id| nest_role(id, direct, flat).map(|role| (id.clone(), role)))
        .collect()
}

fn nest_role(
    id: &str,
    direct: &BTreeMap<RoleId, BTreeSet<RoleId>>,
    flat: &BTreeMap<RoleId, FlattenedRole>,
) -> Option<NestedRole> {
    let role = flat.get(id)?;

    let subroles = direct
        .get(id)
        .into_iter()
        .flatten()
        .filter_map(|sub| nest_role(sub, direct, flat).map(|nested| (sub.clone(), nested)))
        .collect();

    Some(NestedRole {
        id: role.id.clone(),
        display_name: role.display_name.clone(),
        backends_groups: role.backends_groups.clone(),
        lc_admins: role.lc_admins,
        subroles,
    })
}
