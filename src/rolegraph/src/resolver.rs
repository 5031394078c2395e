//! Membership resolution against the reduced hierarchy
//!
//! Starting from every root, a matched role hands evaluation down to its
//! direct subroles. A matched role with a matched subrole is only an implied
//! ancestor; a matched role with no matched subrole is reported as one of the
//! principal's most specific roles.
//!
//! All scratch state lives in a `ResolutionContext` created per call, so a
//! resolver can be shared freely between threads.

use crate::types::{BackendGroups, FlattenedRole, Membership, RoleId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Per-call resolution state
#[derive(Debug)]
struct ResolutionContext<'a, 'p> {
    /// Groups the principal holds
    principal: &'p BackendGroups,

    /// Roles known to match
    matched: HashSet<&'a str>,

    /// Roles known not to match
    not_matched: HashSet<&'a str>,

    /// Groups referenced by matched roles
    used: BackendGroups,

    /// Most specific matches
    roles: BTreeSet<RoleId>,

    /// Matches implied by a more specific match
    ancestors: BTreeSet<RoleId>,
}

impl<'a, 'p> ResolutionContext<'a, 'p> {
    fn new(principal: &'p BackendGroups) -> Self {
        Self {
            principal,
            matched: HashSet::new(),
            not_matched: HashSet::new(),
            used: BackendGroups::new(),
            roles: BTreeSet::new(),
            ancestors: BTreeSet::new(),
        }
    }

    fn holds_all(&self, required: &BackendGroups) -> bool {
        required.iter().all(|(backend, groups)| match self.principal.get(backend) {
            Some(held) => groups.iter().all(|group| held.contains(group)),
            None => false,
        })
    }

    fn mark_used(&mut self, required: &BackendGroups) {
        for (backend, groups) in required {
            self.used
                .entry(backend.clone())
                .or_default()
                .extend(groups.iter().cloned());
        }
    }

    fn finish(self) -> Membership {
        let mut unused_groups = BackendGroups::new();
        for (backend, groups) in self.principal {
            let used = self.used.get(backend);
            let leftover: BTreeSet<String> = groups
                .iter()
                .filter(|group| used.map_or(true, |used| !used.contains(*group)))
                .cloned()
                .collect();
            if !leftover.is_empty() {
                unused_groups.insert(backend.clone(), leftover);
            }
        }

        Membership {
            roles: self.roles,
            ancestors: self.ancestors,
            unused_groups,
        }
    }
}

/// Read-only view over a built hierarchy that resolves principals
#[derive(Debug, Clone, Copy)]
pub struct MembershipResolver<'a> {
    roles: &'a BTreeMap<RoleId, FlattenedRole>,
    subroles: &'a BTreeMap<RoleId, BTreeSet<RoleId>>,
    roots: &'a BTreeSet<RoleId>,
}

impl<'a> MembershipResolver<'a> {
    /// Create a resolver over a flattened table, its direct-subrole relation
    /// and the roots of the forest
    pub fn new(
        roles: &'a BTreeMap<RoleId, FlattenedRole>,
        subroles: &'a BTreeMap<RoleId, BTreeSet<RoleId>>,
        roots: &'a BTreeSet<RoleId>,
    ) -> Self {
        Self {
            roles,
            subroles,
            roots,
        }
    }

    /// Resolve the principal's most specific roles and unused groups
    pub fn resolve(&self, principal: &BackendGroups) -> Membership {
        let mut ctx = ResolutionContext::new(principal);
        for root in self.roots {
            self.check_member(root, &mut ctx);
        }
        ctx.finish()
    }

    /// Evaluate `id` and, if it matches, every subrole beneath it
    ///
    /// Returns whether the principal is a member of `id`.
    fn check_member(&self, id: &'a str, ctx: &mut ResolutionContext<'a, '_>) -> bool {
        if ctx.not_matched.contains(id) {
            return false;
        }
        // Already matched: its subtree has been walked and recorded
        if ctx.matched.contains(id) {
            return true;
        }

        let Some(role) = self.roles.get(id) else {
            return false;
        };
        if !ctx.holds_all(&role.backends_groups) {
            ctx.not_matched.insert(id);
            return false;
        }

        ctx.matched.insert(id);
        ctx.mark_used(&role.backends_groups);

        let mut deeper_match = false;
        if let Some(subroles) = self.subroles.get(id) {
            for sub in subroles {
                // no short-circuit: every matching branch must be visited
                if self.check_member(sub, ctx) {
                    deeper_match = true;
                }
            }
        }

        if deeper_match {
            ctx.ancestors.insert(id.to_string());
        } else {
            ctx.roles.insert(id.to_string());
        }
        true
    }
}
