//! Config loader: assembles sources in precedence order and validates.

use super::merge::merge_policy::{builder_with_defaults, environment_source};
use super::sources::{global_file, workspace_file};
use super::RosterConfig;
use crate::error::EngineError;
use config::File;
use std::path::Path;

/// Loads [`RosterConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<RosterConfig, EngineError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: RosterConfig = builder
            .add_source(environment_source())
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    /// Defaults, then exactly `path`, then environment.
    pub fn load_from_file(path: &Path) -> Result<RosterConfig, EngineError> {
        if !path.exists() {
            return Err(EngineError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let config: RosterConfig = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment_source())
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    fn validated(config: RosterConfig) -> Result<RosterConfig, EngineError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            EngineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
