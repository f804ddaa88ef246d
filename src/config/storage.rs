//! Storage section of the configuration.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage paths and durability settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Store directory; relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Flush to disk after every committed command
    #[serde(default)]
    pub flush_on_commit: bool,
}

pub(crate) fn default_store_path() -> PathBuf {
    PathBuf::from(".roster/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            flush_on_commit: false,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        Ok(())
    }

    /// Absolute store path for a workspace.
    pub fn resolve_path(&self, workspace_root: &Path) -> Result<PathBuf, EngineError> {
        self.validate().map_err(EngineError::ConfigError)?;
        if self.path.is_absolute() {
            Ok(self.path.clone())
        } else {
            Ok(workspace_root.join(&self.path))
        }
    }
}
