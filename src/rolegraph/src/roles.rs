//! Resolved role model
//!
//! [`Roles`] runs the whole pipeline once (flatten, containment, reduction,
//! nesting, admin closure) and is immutable afterwards. It is `Send + Sync`
//! and can be shared behind an `Arc` by any number of readers.
//!
//! # Example
//!
//! ```rust
//! use rolegraph::{backend_groups, Roles};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roles = Roles::from_yaml_str(
//!     r#"
//! viewer:
//!   display_name: Viewers
//!   backends_groups: {ldap: [readers]}
//!   subroles:
//!     editor:
//!       display_name: Editors
//!       backends_groups: {ldap: [writers]}
//! "#,
//!     "inline",
//! )?;
//!
//! let membership = roles.resolve(&backend_groups([("ldap", vec!["readers", "writers"])]));
//! assert!(membership.roles.contains("editor"));
//! assert!(!membership.roles.contains("viewer"));
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, RoleError};
use crate::hierarchy::{flatten, nest, reduce, ContainmentGraph};
use crate::loader;
use crate::resolver::MembershipResolver;
use crate::types::{
    BackendGroups, FlattenedRole, GroupRoles, Membership, NestedRole, RoleDocument, RoleId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Summary counts of a built model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleStats {
    /// Number of roles
    pub roles: usize,
    /// Number of distinct backends
    pub backends: usize,
    /// Number of roles with no less specific role
    pub roots: usize,
    /// Number of direct subrole edges
    pub edges: usize,
    /// Number of administrator roles
    pub admin_roles: usize,
}

/// Fully resolved, immutable role model
#[derive(Debug, Clone)]
pub struct Roles {
    /// Where the definition came from (file path or caller supplied name)
    source: String,

    flattened: BTreeMap<RoleId, FlattenedRole>,

    graph: ContainmentGraph,

    /// Reduced relation: role -> direct subroles
    subroles: BTreeMap<RoleId, BTreeSet<RoleId>>,

    /// Reduced inverse: role -> direct parents
    parents: BTreeMap<RoleId, BTreeSet<RoleId>>,

    /// Resolution entry points: roles with nothing above them
    roots: BTreeSet<RoleId>,

    /// Every role at the top level, each with its subtree beneath it
    nested: BTreeMap<RoleId, NestedRole>,

    admin_roles: BTreeSet<RoleId>,
}

impl Roles {
    /// Load and build the model from a YAML role file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = loader::load_file(path)?;
        Self::build(document, path.display().to_string())
    }

    /// Parse and build the model from YAML text
    pub fn from_yaml_str(text: &str, source: &str) -> Result<Self> {
        let document = loader::parse_document(text, source)?;
        Self::build(document, source.to_string())
    }

    /// Build the model from an already parsed document
    pub fn from_document(document: RoleDocument) -> Result<Self> {
        Self::build(document, "<document>".to_string())
    }

    fn build(document: RoleDocument, source: String) -> Result<Self> {
        loader::check_unique_ids(&document, &source)?;

        let flattened = flatten(&document);
        let graph = ContainmentGraph::build(&flattened)?;
        let subroles = reduce(graph.supersets());
        let parents = reduce(graph.subsets());
        let roots = graph.roots();
        let every_role: BTreeSet<RoleId> = flattened.keys().cloned().collect();
        let nested = nest(&subroles, &flattened, &every_role);

        let mut admin_roles = BTreeSet::new();
        for role in flattened.values().filter(|role| role.lc_admins) {
            collect_admins(&role.id, &subroles, &mut admin_roles);
        }

        let roles = Self {
            source,
            flattened,
            graph,
            subroles,
            parents,
            roots,
            nested,
            admin_roles,
        };

        let stats = roles.stats();
        info!(
            source = %roles.source,
            roles = stats.roles,
            backends = stats.backends,
            roots = stats.roots,
            edges = stats.edges,
            admin_roles = stats.admin_roles,
            "Loaded role definitions"
        );

        Ok(roles)
    }

    /// Source the model was built from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All role ids, sorted
    pub fn all_roles(&self) -> Vec<&str> {
        self.flattened.keys().map(String::as_str).collect()
    }

    /// Whether `id` names a role
    pub fn contains(&self, id: &str) -> bool {
        self.flattened.contains_key(id)
    }

    /// Flattened role by id
    pub fn role(&self, id: &str) -> Result<&FlattenedRole> {
        self.flattened
            .get(id)
            .ok_or_else(|| RoleError::UnknownRole(id.to_string()))
    }

    /// Display name of a role
    pub fn display_name(&self, id: &str) -> Result<&str> {
        self.role(id).map(|role| role.display_name.as_str())
    }

    /// Effective group requirements of a role
    pub fn groups(&self, id: &str) -> Result<&BackendGroups> {
        self.role(id).map(|role| &role.backends_groups)
    }

    /// Every backend referenced by some role
    pub fn backends(&self) -> &BTreeSet<String> {
        self.graph.backends()
    }

    /// backend -> group -> roles referencing the group
    pub fn group_roles(&self) -> &GroupRoles {
        self.graph.group_roles()
    }

    /// Dense containment graph
    pub fn graph(&self) -> &ContainmentGraph {
        &self.graph
    }

    pub fn flattened(&self) -> &BTreeMap<RoleId, FlattenedRole> {
        &self.flattened
    }

    /// Nested view keyed by every role id
    pub fn nested(&self) -> &BTreeMap<RoleId, NestedRole> {
        &self.nested
    }

    /// Roles with no less specific role (resolution entry points)
    pub fn roots(&self) -> &BTreeSet<RoleId> {
        &self.roots
    }

    /// Direct subroles of a role
    pub fn direct_subroles(&self, id: &str) -> Result<&BTreeSet<RoleId>> {
        self.subroles
            .get(id)
            .ok_or_else(|| RoleError::UnknownRole(id.to_string()))
    }

    /// Direct parents of a role
    pub fn direct_parents(&self, id: &str) -> Result<&BTreeSet<RoleId>> {
        self.parents
            .get(id)
            .ok_or_else(|| RoleError::UnknownRole(id.to_string()))
    }

    /// Resolve a principal's groups into roles and unused groups
    pub fn resolve(&self, principal: &BackendGroups) -> Membership {
        MembershipResolver::new(&self.flattened, &self.subroles, &self.roots).resolve(principal)
    }

    /// True if any of `roles` is an administrator role
    pub fn is_admin<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roles
            .into_iter()
            .any(|role| self.admin_roles.contains(role.as_ref()))
    }

    pub fn admin_roles(&self) -> &BTreeSet<RoleId> {
        &self.admin_roles
    }

    /// YAML dump of the nested view
    pub fn dump_nested(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.nested)?)
    }

    /// YAML dump of the flattened table
    pub fn dump_flattened(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.flattened)?)
    }

    pub fn stats(&self) -> RoleStats {
        RoleStats {
            roles: self.flattened.len(),
            backends: self.graph.backends().len(),
            roots: self.roots.len(),
            edges: self.subroles.values().map(BTreeSet::len).sum(),
            admin_roles: self.admin_roles.len(),
        }
    }
}

fn collect_admins(
    id: &str,
    subroles: &BTreeMap<RoleId, BTreeSet<RoleId>>,
    admins: &mut BTreeSet<RoleId>,
) {
    if !admins.insert(id.to_string()) {
        return;
    }
    for sub in subroles.get(id).into_iter().flatten() {
        collect_admins(sub, subroles, admins);
    }
}
