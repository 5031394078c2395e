//! Reloadable role model holder
//!
//! The store hands out `Arc<Roles>` snapshots. A reload builds a complete new
//! model before taking the write lock, so readers only ever see a previous or
//! a fully built model. A failed reload keeps serving the previous one.

use crate::error::Result;
use crate::roles::Roles;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Role model backed by a definition file
#[derive(Debug)]
pub struct RoleStore {
    path: PathBuf,
    current: RwLock<Arc<Roles>>,
}

impl RoleStore {
    /// Load the initial model from `path`
    ///
    /// # Errors
    ///
    /// Any load error: without an initial model the store cannot serve.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let roles = Roles::load(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(roles)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current model
    pub fn snapshot(&self) -> Arc<Roles> {
        Arc::clone(&*self.current.read())
    }

    /// Rebuild the model from the definition file and swap it in
    ///
    /// On error the previous model stays in place and the error is returned.
    pub fn reload(&self) -> Result<Arc<Roles>> {
        match Roles::load(&self.path) {
            Ok(roles) => {
                let roles = Arc::new(roles);
                *self.current.write() = Arc::clone(&roles);
                info!(path = %self.path.display(), "Reloaded role definitions");
                Ok(roles)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Rejected role definition reload, keeping previous model"
                );
                Err(e)
            }
        }
    }

    /// Swap in a model built elsewhere
    pub fn replace(&self, roles: Roles) -> Arc<Roles> {
        let roles = Arc::new(roles);
        *self.current.write() = Arc::clone(&roles);
        roles
    }
}
