//! Authored inheritance resolution

use crate::types::{merge_groups, BackendGroups, FlattenedRole, RoleDocument, RoleId, RoleNode};
use std::collections::BTreeMap;

/// Flatten an authored document into a table of self-contained roles
///
/// Each subrole's groups are merged with the groups of every node it is
/// nested in. Ids are expected to be unique across the whole document.
pub fn flatten(document: &RoleDocument) -> BTreeMap<RoleId, FlattenedRole> {
    let mut flat = BTreeMap::new();
    flatten_level(document, None, &mut flat);
    flat
}

fn flatten_level(
    level: &BTreeMap<RoleId, RoleNode>,
    inherited: Option<&BackendGroups>,
    out: &mut BTreeMap<RoleId, FlattenedRole>,
) {
    for (id, node) in level {
        let groups = match inherited {
            Some(parent) => merge_groups(&node.backends_groups, parent),
            None => node.backends_groups.clone(),
        };

        flatten_level(&node.subroles, Some(&groups), out);

        out.insert(
            id.clone(),
            FlattenedRole {
                id: id.clone(),
                display_name: node.display_name.clone(),
                backends_groups: groups,
                lc_admins: node.lc_admins,
            },
        );
    }
}
