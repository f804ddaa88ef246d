//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.path", ".roster/store")?
        .set_default("storage.flush_on_commit", false)?
        .set_default("transaction.max_attempts", 16)
}

/// Environment overrides, applied last: `ROSTER__STORAGE__PATH=...`.
pub fn environment_source() -> Environment {
    Environment::with_prefix("ROSTER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
