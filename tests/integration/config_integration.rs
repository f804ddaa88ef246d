//! Configuration loading against real workspaces

use roster::config::{ConfigLoader, RosterConfig};
use roster::Engine;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_store_opens_at_configured_path() {
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[storage]\npath = \"var/directory\"\nflush_on_commit = true\n",
    )
    .unwrap();

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert!(config.storage.flush_on_commit);
    let engine = Engine::open_with_config(&config, workspace.path()).unwrap();
    engine.create_group("Configured", &Default::default()).unwrap();

    assert!(workspace.path().join("var/directory").exists());
}

#[test]
fn test_explicit_config_file_with_bad_logging_is_rejected() {
    let workspace = TempDir::new().unwrap();
    let file = workspace.path().join("roster.toml");
    std::fs::write(&file, "[logging]\noutput = \"syslog\"\n").unwrap();

    let err = ConfigLoader::load_from_file(&file).unwrap_err();
    assert_eq!(err.kind(), roster::ErrorKind::Configuration);
    assert!(err.to_string().contains("Logging"));
}

#[test]
fn test_default_config_resolves_store_under_workspace() {
    let config = RosterConfig::default();
    let root = PathBuf::from("/srv/contacts");
    assert_eq!(
        config.store_path(&root),
        Some(PathBuf::from("/srv/contacts/.roster/store"))
    );
}
