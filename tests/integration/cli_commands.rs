//! CLI routing through RunContext against a temp workspace

use clap::Parser;
use roster::cli::{map_error, Cli, OutputFormat, RunContext};
use roster::ApiResponse;
use tempfile::TempDir;

fn run(context: &RunContext, workspace: &TempDir, args: &[&str]) -> Result<String, roster::EngineError> {
    let ws = workspace.path().to_string_lossy().to_string();
    let mut argv = vec!["roster", "--workspace", ws.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    context.execute(&cli.command, cli.format)
}

fn json(output: &str) -> ApiResponse {
    serde_json::from_str(output).unwrap()
}

#[test]
fn test_contact_and_group_round_through_cli() {
    let workspace = TempDir::new().unwrap();
    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();

    let created = json(&run(&context, &workspace, &["--format", "json", "group", "add", "Family"]).unwrap());
    assert_eq!(created.status_code, 201);
    let group_id = created.data.unwrap()["group"]["id"].as_u64().unwrap().to_string();

    let added = json(
        &run(
            &context,
            &workspace,
            &[
                "--format",
                "json",
                "contact",
                "add",
                "--first-name",
                "Ann",
                "--email",
                "ann@example.com",
                "--birth-date",
                "1990-04-01",
                "--groups",
                group_id.as_str(),
            ],
        )
        .unwrap(),
    );
    assert_eq!(added.status_code, 201);
    let data = added.data.unwrap();
    assert_eq!(data["outcome"], "contact_created");
    let contact_id = data["contact"]["id"].as_u64().unwrap().to_string();
    assert_eq!(data["contact"]["birth_date"], "1990-04-01");

    let listing = run(&context, &workspace, &["contact", "list", "--group", group_id.as_str()]).unwrap();
    assert!(listing.contains("ann@example.com"));

    let detail = run(&context, &workspace, &["contact", "get", contact_id.as_str()]).unwrap();
    assert!(detail.contains(&format!("Groups:     {}", group_id)));

    let groups = run(&context, &workspace, &["group", "list"]).unwrap();
    assert!(groups.contains("Family"));
}

#[test]
fn test_update_without_groups_keeps_memberships() {
    let workspace = TempDir::new().unwrap();
    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();
    let engine = context.engine();
    let group = engine
        .create_group("Keep", &Default::default())
        .unwrap()
        .group
        .id;
    let contact = engine
        .create_contact(
            roster::store::ContactFields {
                first_name: Some("Ann".to_string()),
                ..Default::default()
            },
            &[group].into_iter().collect(),
        )
        .unwrap();
    let contact_arg = contact.to_string();

    run(
        &context,
        &workspace,
        &["contact", "update", contact_arg.as_str(), "--last-name", "Lee"],
    )
    .unwrap();
    assert_eq!(engine.groups_of_contact(contact).unwrap().len(), 1);

    run(
        &context,
        &workspace,
        &["contact", "update", contact_arg.as_str(), "--clear-groups"],
    )
    .unwrap();
    assert!(engine.groups_of_contact(contact).unwrap().is_empty());
    assert_eq!(
        engine.get_contact(contact).unwrap().unwrap().last_name.as_deref(),
        Some("Lee")
    );
}

#[test]
fn test_exec_runs_tagged_json_command() {
    let workspace = TempDir::new().unwrap();
    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();

    let output = run(
        &context,
        &workspace,
        &["exec", r#"{"command":"create_group","group_name":"Raw"}"#],
    )
    .unwrap();
    assert!(output.starts_with("Created group"));

    let err = run(&context, &workspace, &["exec", r#"{"command":"launch_rockets"}"#]).unwrap_err();
    assert_eq!(err.kind(), roster::ErrorKind::Validation);
}

#[test]
fn test_not_found_maps_to_failure_envelope() {
    let workspace = TempDir::new().unwrap();
    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();

    let err = run(&context, &workspace, &["group", "add-members", "99", "1,2"]).unwrap_err();
    let envelope = json(&map_error(&err, OutputFormat::Json));
    assert_eq!(envelope.status_code, 404);
    assert!(!envelope.success);
    assert!(envelope.data.is_none());
}

#[test]
fn test_check_and_config_show() {
    let workspace = TempDir::new().unwrap();
    let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();

    let check = run(&context, &workspace, &["check"]).unwrap();
    assert!(check.starts_with("Integrity check passed"));

    let config = run(&context, &workspace, &["config", "show"]).unwrap();
    assert!(config.contains("[storage]"));
    assert!(config.contains("max_attempts"));
}
