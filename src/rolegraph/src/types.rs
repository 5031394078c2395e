//! Core role types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unique role identifier
pub type RoleId = String;

/// Group names required (or held) per backend
pub type BackendGroups = BTreeMap<String, BTreeSet<String>>;

/// Reverse index: backend -> group -> roles referencing that group
pub type GroupRoles = BTreeMap<String, BTreeMap<String, BTreeSet<RoleId>>>;

/// Authored role document: top-level role id -> role node
pub type RoleDocument = BTreeMap<RoleId, RoleNode>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Role as authored in the definition document
///
/// `subroles` inherit the groups of the node they are nested in and add
/// their own on top.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleNode {
    /// Human readable name
    pub display_name: String,

    /// Groups required per backend
    pub backends_groups: BackendGroups,

    /// Nested roles extending this one
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subroles: BTreeMap<RoleId, RoleNode>,

    /// Members of this role (and every role nested beneath it) are administrators
    #[serde(rename = "LC_admins", default, skip_serializing_if = "is_false")]
    pub lc_admins: bool,
}

impl RoleNode {
    /// Create a role node with no group requirements
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Require `groups` on `backend`
    pub fn with_groups<I, S>(mut self, backend: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backends_groups
            .entry(backend.into())
            .or_default()
            .extend(groups.into_iter().map(Into::into));
        self
    }

    /// Nest a subrole beneath this node
    pub fn with_subrole(mut self, id: impl Into<RoleId>, node: RoleNode) -> Self {
        self.subroles.insert(id.into(), node);
        self
    }

    /// Flag this role as an administrator role
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.lc_admins = admin;
        self
    }
}

/// Role with authored inheritance resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenedRole {
    #[serde(skip)]
    pub id: RoleId,

    pub display_name: String,

    /// Own groups merged with every authored ancestor's groups
    pub backends_groups: BackendGroups,

    #[serde(rename = "LC_admins", skip_serializing_if = "is_false")]
    pub lc_admins: bool,
}

/// Role in the reduced hierarchy, owning copies of its direct subroles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedRole {
    #[serde(skip)]
    pub id: RoleId,

    pub display_name: String,

    pub backends_groups: BackendGroups,

    #[serde(rename = "LC_admins", skip_serializing_if = "is_false")]
    pub lc_admins: bool,

    pub subroles: BTreeMap<RoleId, NestedRole>,
}

impl NestedRole {
    /// Ids of this role and every role nested beneath it
    pub fn descendant_ids(&self) -> BTreeSet<RoleId> {
        let mut ids = BTreeSet::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut BTreeSet<RoleId>) {
        ids.insert(self.id.clone());
        for sub in self.subroles.values() {
            sub.collect_ids(ids);
        }
    }
}

/// Outcome of resolving a principal's groups against the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Membership {
    /// Most specific roles the principal satisfies
    pub roles: BTreeSet<RoleId>,

    /// Matched roles implied by a more specific matched role
    pub ancestors: BTreeSet<RoleId>,

    /// Principal groups not referenced by any matched role
    pub unused_groups: BackendGroups,
}

/// Union of two group mappings, per backend
pub fn merge_groups(left: &BackendGroups, right: &BackendGroups) -> BackendGroups {
    let mut merged = left.clone();
    for (backend, groups) in right {
        merged
            .entry(backend.clone())
            .or_default()
            .extend(groups.iter().cloned());
    }
    merged
}

/// True when every backend and group of `inner` is also in `outer`
pub fn contains_groups(outer: &BackendGroups, inner: &BackendGroups) -> bool {
    inner.iter().all(|(backend, groups)| match outer.get(backend) {
        Some(held) => groups.is_subset(held),
        None => false,
    })
}

/// Build a group mapping from `(backend, groups)` pairs
pub fn backend_groups<'a, I, G>(entries: I) -> BackendGroups
where
    I: IntoIterator<Item = (&'a str, G)>,
    G: IntoIterator<Item = &'a str>,
{
    let mut map = BackendGroups::new();
    for (backend, groups) in entries {
        map.entry(backend.to_string())
            .or_default()
            .extend(groups.into_iter().map(str::to_string));
    }
    map
}
