//! Role hierarchy inference
//!
//! Turns an authored role document into a containment hierarchy:
//!
//! - **Flattening**: authored `subroles` inherit their parent's groups
//! - **Containment**: a role whose requirements strictly include another
//!   role's is more specific and sits beneath it
//! - **Ambiguity detection**: two ids with identical requirements are rejected
//! - **Transitive reduction**: only direct edges are kept
//! - **Nesting**: the reduced edges become an owned forest for export
//!
//! # Example
//!
//! ```rust
//! use rolegraph::hierarchy::{flatten, ContainmentGraph, reduce, nest};
//! use rolegraph::{RoleDocument, RoleNode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut document = RoleDocument::new();
//! document.insert(
//!     "viewer".to_string(),
//!     RoleNode::new("Viewers")
//!         .with_groups("ldap", ["readers"])
//!         .with_subrole("editor", RoleNode::new("Editors").with_groups("ldap", ["writers"])),
//! );
//!
//! let flat = flatten(&document);
//! let graph = ContainmentGraph::build(&flat)?;
//! assert!(graph.is_ancestor("viewer", "editor"));
//!
//! let direct = reduce(graph.supersets());
//! let forest = nest(&direct, &flat, &graph.roots());
//! assert!(forest["viewer"].subroles.contains_key("editor"));
//! # Ok(())
//! # }
//! ```

pub mod flatten;
pub mod graph;
pub mod nest;


pub use flatten::flatten;
pub use graph::{reduce, ContainmentGraph};
pub use nest::nest;
