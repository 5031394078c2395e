//! Role definition document loader
//!
//! Reads the YAML role file into a [`RoleDocument`]. The document is parsed
//! through `RawNode`, which keeps every mapping entry as written, so a key
//! repeated in the source is reported instead of silently overwriting the
//! first occurrence. Role ids must also be unique across nesting levels.
//!
//! ```yaml
//! users:
//!   display_name: Users
//!   backends_groups:
//!     ldap: [users]
//!   subroles:
//!     admins:
//!       display_name: Administrators
//!       LC_admins: true
//!       backends_groups:
//!         ldap: [admins]
//! ```

use crate::error::{Result, RoleError};
use crate::types::{BackendGroups, RoleDocument, RoleNode};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// YAML node with mapping entries kept in source order, duplicates included
#[derive(Debug, Clone, PartialEq)]
enum RawNode {
    Null,
    Bool(bool),
    Text(String),
    /// Unquoted float; its source spelling is lost, so it cannot name anything
    Float(f64),
    Seq(Vec<RawNode>),
    Map(Vec<(RawNode, RawNode)>),
}

impl RawNode {
    fn kind(&self) -> &'static str {
        match self {
            RawNode::Null => "null",
            RawNode::Bool(_) => "boolean",
            RawNode::Text(_) => "scalar",
            RawNode::Float(_) => "float (quote it to use it as a name)",
            RawNode::Seq(_) => "sequence",
            RawNode::Map(_) => "mapping",
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            RawNode::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for RawNode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawVisitor;

        impl<'de> Visitor<'de> for RawVisitor {
            type Value = RawNode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a YAML scalar, sequence or mapping")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Null)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Null)
            }

            fn visit_some<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<RawNode, D::Error> {
                RawNode::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Text(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Text(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<RawNode, E> {
                Ok(RawNode::Text(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<RawNode, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(RawNode::Seq(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RawNode, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(RawNode::Map(entries))
            }
        }

        deserializer.deserialize_any(RawVisitor)
    }
}

/// Load and parse the role definition file at `path`
pub fn load_file(path: impl AsRef<Path>) -> Result<RoleDocument> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| RoleError::SourceUnavailable {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&text, &path.display().to_string())
}

/// Parse a role definition document
///
/// `source_id` names the document in error messages.
pub fn parse_document(text: &str, source_id: &str) -> Result<RoleDocument> {
    if text.trim().is_empty() {
        return Ok(RoleDocument::new());
    }

    let raw: RawNode = serde_yaml::from_str(text).map_err(|e| RoleError::Malformed {
        source_id: source_id.to_string(),
        reason: e.to_string(),
    })?;

    let mut parser = DocumentParser {
        source_id,
        seen: BTreeSet::new(),
    };

    match &raw {
        RawNode::Null => Ok(RoleDocument::new()),
        RawNode::Map(entries) => parser.roles(entries),
        other => Err(parser.malformed(format!(
            "top level must be a mapping of role ids, found a {}",
            other.kind()
        ))),
    }
}

/// Fail with `DuplicateKey` if a role id appears more than once in the tree
pub(crate) fn check_unique_ids(document: &RoleDocument, source_id: &str) -> Result<()> {
    fn walk(
        level: &BTreeMap<String, RoleNode>,
        seen: &mut BTreeSet<String>,
        source_id: &str,
    ) -> Result<()> {
        for (id, node) in level {
            if !seen.insert(id.clone()) {
                return Err(RoleError::DuplicateKey {
                    key: id.clone(),
                    source_id: source_id.to_string(),
                });
            }
            walk(&node.subroles, seen, source_id)?;
        }
        Ok(())
    }

    walk(document, &mut BTreeSet::new(), source_id)
}

struct DocumentParser<'s> {
    source_id: &'s str,
    /// Role ids seen so far, across all nesting levels
    seen: BTreeSet<String>,
}

impl DocumentParser<'_> {
    fn malformed(&self, reason: String) -> RoleError {
        RoleError::Malformed {
            source_id: self.source_id.to_string(),
            reason,
        }
    }

    fn duplicate(&self, key: &str) -> RoleError {
        RoleError::DuplicateKey {
            key: key.to_string(),
            source_id: self.source_id.to_string(),
        }
    }

    fn key<'n>(&self, key: &'n RawNode, context: &str) -> Result<&'n str> {
        key.as_text().ok_or_else(|| {
            self.malformed(format!("{} keys must be scalars, found a {}", context, key.kind()))
        })
    }

    fn roles(&mut self, entries: &[(RawNode, RawNode)]) -> Result<BTreeMap<String, RoleNode>> {
        let mut roles = BTreeMap::new();
        for (key, value) in entries {
            let id = self.key(key, "role")?.to_string();
            if !self.seen.insert(id.clone()) {
                return Err(self.duplicate(&id));
            }
            let node = self.role(&id, value)?;
            roles.insert(id, node);
        }
        Ok(roles)
    }

    fn role(&mut self, id: &str, value: &RawNode) -> Result<RoleNode> {
        let RawNode::Map(entries) = value else {
            return Err(self.malformed(format!(
                "role `{}` must be a mapping, found a {}",
                id,
                value.kind()
            )));
        };

        let mut attributes = BTreeSet::new();
        let mut display_name = None;
        let mut backends_groups = None;
        let mut subroles = BTreeMap::new();
        let mut lc_admins = false;

        for (key, value) in entries {
            let name = self.key(key, "attribute")?;
            if !attributes.insert(name) {
                return Err(self.duplicate(&format!("{}.{}", id, name)));
            }

            match name {
                "display_name" => match value {
                    RawNode::Text(text) => display_name = Some(text.clone()),
                    other => {
                        return Err(self.malformed(format!(
                            "`display_name` of role `{}` must be a string, found a {}",
                            id,
                            other.kind()
                        )))
                    }
                },
                "backends_groups" => backends_groups = Some(self.backends_groups(id, value)?),
                "subroles" => match value {
                    RawNode::Null => {}
                    RawNode::Map(children) => subroles = self.roles(children)?,
                    other => {
                        return Err(self.malformed(format!(
                            "`subroles` of role `{}` must be a mapping, found a {}",
                            id,
                            other.kind()
                        )))
                    }
                },
                "LC_admins" => match value {
                    RawNode::Bool(flag) => lc_admins = *flag,
                    other => {
                        return Err(self.malformed(format!(
                            "`LC_admins` of role `{}` must be a boolean, found a {}",
                            id,
                            other.kind()
                        )))
                    }
                },
                other => debug!(role = id, key = other, "Ignoring unknown role attribute"),
            }
        }

        let display_name = display_name.ok_or_else(|| self.missing("display_name", id))?;
        let backends_groups = backends_groups.ok_or_else(|| self.missing("backends_groups", id))?;

        Ok(RoleNode {
            display_name,
            backends_groups,
            subroles,
            lc_admins,
        })
    }

    fn missing(&self, field: &'static str, role: &str) -> RoleError {
        RoleError::MissingRequiredField {
            field,
            role: role.to_string(),
            source_id: self.source_id.to_string(),
        }
    }

    fn backends_groups(&self, id: &str, value: &RawNode) -> Result<BackendGroups> {
        let entries = match value {
            RawNode::Null => return Ok(BackendGroups::new()),
            RawNode::Map(entries) => entries,
            other => {
                return Err(self.malformed(format!(
                    "`backends_groups` of role `{}` must be a mapping, found a {}",
                    id,
                    other.kind()
                )))
            }
        };

        let mut backends = BackendGroups::new();
        for (key, groups) in entries {
            let backend = self.key(key, "backend")?;
            if backends.contains_key(backend) {
                return Err(self.duplicate(&format!("{}.backends_groups.{}", id, backend)));
            }

            let groups = match groups {
                RawNode::Null => BTreeSet::new(),
                RawNode::Seq(items) => items
                    .iter()
                    .map(|item| {
                        item.as_text().map(str::to_string).ok_or_else(|| {
                            self.malformed(format!(
                                "groups of backend `{}` in role `{}` must be scalars, found a {}",
                                backend,
                                id,
                                item.kind()
                            ))
                        })
                    })
                    .collect::<Result<BTreeSet<_>>>()?,
                other => {
                    return Err(self.malformed(format!(
                        "groups of backend `{}` in role `{}` must be a sequence, found a {}",
                        backend,
                        id,
                        other.kind()
                    )))
                }
            };
            backends.insert(backend.to_string(), groups);
        }
        Ok(backends)
    }
}
