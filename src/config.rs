//! Configuration System
//!
//! Layered configuration for the directory engine: built-in defaults, the
//! user-level config file, workspace config files, then `ROSTER__*` environment
//! variables. Validated after every load.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::transaction::TransactionConfig;

mod facade;
mod merge;
mod sources;
mod storage;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use storage::StorageConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RosterConfig {
    /// Where and how the directory store is kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Transaction retry policy
    #[serde(default)]
    pub transaction: TransactionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Storage(String),
    Transaction(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Transaction(msg) => write!(f, "Transaction: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RosterConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.transaction.validate() {
            errors.push(ValidationError::Transaction(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Resolved store location for `workspace_root`.
    pub fn store_path(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.storage.resolve_path(workspace_root).ok()
    }
}
