//! Property tests for hierarchy inference and membership resolution
//!
//! Role sets are generated with pairwise distinct requirements so every
//! generated document is unambiguous.

use proptest::prelude::*;
use rolegraph::hierarchy::{flatten, reduce};
use rolegraph::{BackendGroups, RoleDocument, RoleId, RoleNode, Roles};
use std::collections::{BTreeMap, BTreeSet};

const BACKENDS: [&str; 2] = ["ldap", "ad"];

fn to_groups(pairs: &BTreeSet<(usize, usize)>) -> BackendGroups {
    let mut groups = BackendGroups::new();
    for (backend, group) in pairs {
        groups
            .entry(BACKENDS[*backend].to_string())
            .or_default()
            .insert(format!("g{}", group));
    }
    groups
}

/// Flat documents of up to 8 roles with distinct requirements
fn document_strategy() -> impl Strategy<Value = RoleDocument> {
    (
        prop::collection::btree_set(prop::collection::btree_set((0..2usize, 0..5usize), 1..5), 1..8),
        prop::collection::vec(prop::bool::weighted(0.2), 8),
    )
        .prop_map(|(requirements, admin_flags)| {
            requirements
                .iter()
                .enumerate()
                .map(|(i, pairs)| {
                    let mut node = RoleNode::new(format!("Role {}", i)).with_admin(admin_flags[i]);
                    node.backends_groups = to_groups(pairs);
                    (format!("r{}", i), node)
                })
                .collect()
        })
}

fn principal_strategy() -> impl Strategy<Value = BackendGroups> {
    prop::collection::btree_set((0..2usize, 0..6usize), 0..10).prop_map(|pairs| to_groups(&pairs))
}

fn holds_all(principal: &BackendGroups, required: &BackendGroups) -> bool {
    required.iter().all(|(backend, groups)| {
        principal
            .get(backend)
            .map_or(false, |held| groups.is_subset(held))
    })
}

fn closure(edges: &BTreeMap<RoleId, BTreeSet<RoleId>>) -> BTreeMap<RoleId, BTreeSet<RoleId>> {
    edges
        .keys()
        .map(|id| {
            let mut reached = BTreeSet::new();
            let mut stack: Vec<&RoleId> = edges[id].iter().collect();
            while let Some(next) = stack.pop() {
                if reached.insert(next.clone()) {
                    stack.extend(edges[next].iter());
                }
            }
            (id.clone(), reached)
        })
        .collect()
}

proptest! {
    #[test]
    fn test_containment_is_a_strict_order(document in document_strategy()) {
        let roles = Roles::from_document(document).unwrap();
        let graph = roles.graph();
        let ids = roles.all_roles();

        for a in &ids {
            prop_assert!(!graph.is_ancestor(a, a));
            for b in &ids {
                prop_assert!(!(graph.is_ancestor(a, b) && graph.is_ancestor(b, a)));
                for c in &ids {
                    if graph.is_ancestor(a, b) && graph.is_ancestor(b, c) {
                        prop_assert!(graph.is_ancestor(a, c));
                    }
                }
            }
        }
    }

    #[test]
    fn test_reduction_preserves_reachability(document in document_strategy()) {
        let roles = Roles::from_document(document).unwrap();
        let dense = roles.graph().supersets();
        let direct = reduce(dense);

        prop_assert_eq!(&closure(&direct), dense);
        for (id, subs) in &direct {
            prop_assert!(subs.is_subset(&dense[id]));
            // no direct edge is implied by another direct edge
            for sub in subs {
                prop_assert!(!subs.iter().any(|via| dense[via].contains(sub)));
            }
        }
    }

    #[test]
    fn test_nested_view_covers_every_role(document in document_strategy()) {
        let roles = Roles::from_document(document).unwrap();

        let all: BTreeSet<RoleId> = roles.all_roles().into_iter().map(String::from).collect();
        let top_level: BTreeSet<RoleId> = roles.nested().keys().cloned().collect();
        prop_assert_eq!(&top_level, &all);

        // the roots alone already reach every role
        let covered: BTreeSet<RoleId> = roles
            .roots()
            .iter()
            .flat_map(|root| roles.nested()[root].descendant_ids())
            .collect();
        prop_assert_eq!(covered, all);

        for (id, role) in roles.nested() {
            let subs: BTreeSet<RoleId> = role.subroles.keys().cloned().collect();
            prop_assert_eq!(&subs, roles.direct_subroles(id).unwrap());
        }

        for root in roles.roots() {
            prop_assert!(roles.direct_parents(root).unwrap().is_empty());
        }
    }

    #[test]
    fn test_resolution_reports_most_specific_matches(
        document in document_strategy(),
        principal in principal_strategy(),
    ) {
        let roles = Roles::from_document(document).unwrap();
        let membership = roles.resolve(&principal);
        let graph = roles.graph();

        prop_assert!(membership.roles.is_disjoint(&membership.ancestors));

        for id in roles.all_roles() {
            let matches = holds_all(&principal, roles.groups(id).unwrap());
            let reported = membership.roles.contains(id) || membership.ancestors.contains(id);
            prop_assert_eq!(matches, reported, "role {}", id);
        }

        for a in &membership.roles {
            for b in &membership.roles {
                prop_assert!(!graph.is_ancestor(a, b));
            }
        }
        for ancestor in &membership.ancestors {
            prop_assert!(membership.roles.iter().any(|role| graph.is_ancestor(ancestor, role)));
        }
    }

    #[test]
    fn test_unused_groups_partition_principal(
        document in document_strategy(),
        principal in principal_strategy(),
    ) {
        let roles = Roles::from_document(document).unwrap();
        let membership = roles.resolve(&principal);

        let mut used = BackendGroups::new();
        for id in membership.roles.iter().chain(&membership.ancestors) {
            for (backend, groups) in roles.groups(id).unwrap() {
                used.entry(backend.clone()).or_default().extend(groups.iter().cloned());
            }
        }

        for (backend, groups) in &principal {
            for group in groups {
                let is_used = used.get(backend).map_or(false, |g| g.contains(group));
                let is_unused = membership
                    .unused_groups
                    .get(backend)
                    .map_or(false, |g| g.contains(group));
                prop_assert!(is_used != is_unused, "{}:{}", backend, group);
            }
        }
        for (backend, groups) in &membership.unused_groups {
            prop_assert!(!groups.is_empty());
            prop_assert!(groups.is_subset(&principal[backend]));
        }
    }

    #[test]
    fn test_admin_closure(document in document_strategy()) {
        let roles = Roles::from_document(document).unwrap();
        let graph = roles.graph();
        let flagged: Vec<&str> = roles
            .flattened()
            .values()
            .filter(|role| role.lc_admins)
            .map(|role| role.id.as_str())
            .collect();

        for id in roles.all_roles() {
            let expected = flagged
                .iter()
                .any(|admin| *admin == id || graph.is_ancestor(admin, id));
            prop_assert_eq!(roles.admin_roles().contains(id), expected, "role {}", id);
        }
    }

    #[test]
    fn test_flatten_is_idempotent(document in document_strategy()) {
        let once = flatten(&document);
        let again: RoleDocument = once
            .iter()
            .map(|(id, role)| {
                let mut node = RoleNode::new(role.display_name.clone()).with_admin(role.lc_admins);
                node.backends_groups = role.backends_groups.clone();
                (id.clone(), node)
            })
            .collect();

        prop_assert_eq!(flatten(&again), once);
    }
}
