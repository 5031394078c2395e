//! Error types for role loading and resolution

use thiserror::Error;

/// Role engine errors
#[derive(Debug, Error)]
pub enum RoleError {
    /// The role definition file could not be opened or read
    #[error("Roles file `{path}` is unavailable")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The same key (role id, backend or attribute) appears twice
    #[error("Duplicate key `{key}` in {source_id}")]
    DuplicateKey { key: String, source_id: String },

    /// A role lacks `display_name` or `backends_groups`
    #[error("Missing key `{field}` in role `{role}` ({source_id})")]
    MissingRequiredField {
        field: &'static str,
        role: String,
        source_id: String,
    },

    /// A node does not have the expected shape
    #[error("Malformed role definition in {source_id}: {reason}")]
    Malformed { source_id: String, reason: String },

    /// Two role ids resolve to identical group requirements
    #[error("Roles `{first}` and `{second}` have identical group requirements")]
    AmbiguousRoleContent { first: String, second: String },

    /// Query by an id that is not in the role table
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Dump serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

impl RoleError {
    /// True for errors raised while loading and building a model
    pub fn is_load_error(&self) -> bool {
        !matches!(self, RoleError::UnknownRole(_) | RoleError::Serialization(_))
    }
}

/// Result type for role operations
pub type Result<T> = std::result::Result<T, RoleError>;
