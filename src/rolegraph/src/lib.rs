//! # Rolegraph
//!
//! Role hierarchy inference and group-membership resolution.
//!
//! A role is a set of required directory groups per backend. From an authored
//! (possibly nested) role document the engine builds:
//!
//! - a **flattened table** with authored inheritance resolved
//! - a **containment hierarchy**: a role requiring strictly more groups than
//!   another is more specific and sits beneath it
//! - a **membership resolver** mapping a principal's groups to its most
//!   specific roles, plus the groups no role accounts for
//! - an **admin closure**: roles flagged `LC_admins` and everything beneath them
//!
//! ## Example
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
//! editor:
//!   display_name: Editors
//!   backends_groups: {ldap: [readers, writers]}
//! admin:
//!   display_name: Administrators
//!   LC_admins: true
//!   backends_groups: {ldap: [readers, writers, admins]}
//! "#,
//!     "roles.yml",
//! )?;
//!
//! let membership = roles.resolve(&backend_groups([("ldap", vec!["readers", "interns"])]));
//! assert_eq!(membership.roles.len(), 1);
//! assert!(membership.roles.contains("viewer"));
//! assert!(membership.unused_groups["ldap"].contains("interns"));
//! assert!(!roles.is_admin(&membership.roles));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod loader;
pub mod resolver;
pub mod roles;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::RolesConfig;
pub use error::{Result, RoleError};
pub use hierarchy::ContainmentGraph;
pub use resolver::MembershipResolver;
pub use roles::{RoleStats, Roles};
pub use store::RoleStore;
pub use types::{
    backend_groups, contains_groups, merge_groups, BackendGroups, FlattenedRole, GroupRoles,
    Membership, NestedRole, RoleDocument, RoleId, RoleNode,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
