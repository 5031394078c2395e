//! Runtime configuration
//!
//! Environment variables:
//! - `ROLES_FILE` - role definition file (default: roles.yml)
//! - `RUST_LOG` - log filter (default: info)

use std::path::PathBuf;

/// Default role definition file
pub const DEFAULT_ROLES_FILE: &str = "roles.yml";

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolesConfig {
    /// Role definition file
    pub roles_file: PathBuf,

    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            roles_file: PathBuf::from(DEFAULT_ROLES_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RolesConfig {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            roles_file: lookup("ROLES_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.roles_file),
            log_filter: lookup("RUST_LOG")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }

    /// Override the role file (e.g. from a command line flag)
    pub fn with_roles_file(mut self, roles_file: Option<PathBuf>) -> Self {
        if let Some(path) = roles_file {
            self.roles_file = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RolesConfig::from_lookup(|_| None);
        assert_eq!(config, RolesConfig::default());
        assert_eq!(config.roles_file, PathBuf::from("roles.yml"));
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> =
            [("ROLES_FILE", "/etc/roles.yml"), ("RUST_LOG", "rolegraph=debug")].into();
        let config = RolesConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.roles_file, PathBuf::from("/etc/roles.yml"));
        assert_eq!(config.log_filter, "rolegraph=debug");
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = RolesConfig::from_lookup(|_| Some(String::new()));
        assert_eq!(config, RolesConfig::default());
    }

    #[test]
    fn test_flag_override() {
        let config = RolesConfig::default().with_roles_file(Some(PathBuf::from("other.yml")));
        assert_eq!(config.roles_file, PathBuf::from("other.yml"));

        let config = RolesConfig::default().with_roles_file(None);
        assert_eq!(config.roles_file, PathBuf::from("roles.yml"));
    }
}
