//! CLI output: command naming and error mapping to the stable CLI surface.

use crate::cli::parse::{Commands, ConfigCommands, ContactCommands, GroupCommands, OutputFormat};
use crate::error::EngineError;
use crate::response::ApiResponse;

/// Command name string for logs (e.g. "contact.add", "group.add_members").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Contact { command } => format!("contact.{}", contact_command_name(command)),
        Commands::Group { command } => format!("group.{}", group_command_name(command)),
        Commands::Exec { .. } => "exec".to_string(),
        Commands::Check => "check".to_string(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => "config.show".to_string(),
        },
    }
}

fn contact_command_name(command: &ContactCommands) -> &'static str {
    match command {
        ContactCommands::Add { .. } => "add",
        ContactCommands::Update { .. } => "update",
        ContactCommands::Get { .. } => "get",
        ContactCommands::List { .. } => "list",
        ContactCommands::Delete { .. } => "delete",
    }
}

fn group_command_name(command: &GroupCommands) -> &'static str {
    match command {
        GroupCommands::Add { .. } => "add",
        GroupCommands::Rename { .. } => "rename",
        GroupCommands::List => "list",
        GroupCommands::Delete { .. } => "delete",
        GroupCommands::AddMembers { .. } => "add_members",
        GroupCommands::RemoveMembers { .. } => "remove_members",
    }
}

/// Map engine errors to a string for CLI output.
///
/// JSON mode prints the failure envelope so scripts can read `error_kind`.
pub fn map_error(e: &EngineError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let response: ApiResponse = ApiResponse::failure(e);
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| e.to_string())
        }
        OutputFormat::Text => format!("error ({}): {}", e.kind().status_code(), e),
    }
}
