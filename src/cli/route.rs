//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::cli::parse::{
    Commands, ConfigCommands, ContactArgs, ContactCommands, GroupCommands, OutputFormat,
};
use crate::cli::presentation::{
    format_contact_detail_text, format_contact_list_text, format_group_list_text,
    format_integrity_report_text, format_outcome_text,
};
use crate::command::{Command, CommandOutcome};
use crate::config::{ConfigLoader, RosterConfig};
use crate::engine::Engine;
use crate::error::{EngineError, StorageError};
use crate::response::ApiResponse;
use crate::store::ContactFields;
use crate::types::{ContactId, ContactIdSet, GroupId, GroupSelection};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

/// Runtime context for CLI execution: workspace, effective config, and the engine.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    engine: Engine,
    config: RosterConfig,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, EngineError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let engine = Engine::open_with_config(&config, &workspace_root)?;
        Ok(Self {
            engine,
            config,
            workspace_root,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands, format: OutputFormat) -> Result<String, EngineError> {
        debug!(workspace = %self.workspace_root.display(), "Routing command");
        match command {
            Commands::Contact { command } => self.handle_contact_command(command, format),
            Commands::Group { command } => self.handle_group_command(command, format),
            Commands::Exec { payload } => self.run_command(Command::from_json(payload)?, format),
            Commands::Check => {
                let report = self.engine.check_integrity()?;
                match format {
                    OutputFormat::Text => Ok(format_integrity_report_text(&report)),
                    OutputFormat::Json => {
                        let message = if report.is_consistent() {
                            "Store is consistent"
                        } else {
                            "Store has integrity issues"
                        };
                        render_json(&ApiResponse::ok(message, report))
                    }
                }
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => match format {
                    OutputFormat::Text => self
                        .config
                        .to_toml()
                        .map_err(|e| EngineError::ConfigError(e.to_string())),
                    OutputFormat::Json => {
                        render_json(&ApiResponse::ok("Effective configuration", &self.config))
                    }
                },
            },
        }
    }

    fn handle_contact_command(
        &self,
        command: &ContactCommands,
        format: OutputFormat,
    ) -> Result<String, EngineError> {
        match command {
            ContactCommands::Add { fields, groups } => self.run_command(
                Command::CreateContact {
                    fields: contact_fields(fields),
                    groups: GroupSelection::Many(group_ids(groups)),
                },
                format,
            ),
            ContactCommands::Update {
                id,
                fields,
                groups,
                clear_groups,
            } => {
                let groups = match groups {
                    Some(groups) => Some(GroupSelection::Many(group_ids(groups))),
                    None if *clear_groups => Some(GroupSelection::default()),
                    None => None,
                };
                self.run_command(
                    Command::UpdateContact {
                        id: ContactId(*id),
                        fields: contact_fields(fields),
                        groups,
                    },
                    format,
                )
            }
            ContactCommands::Get { id } => {
                let id = ContactId(*id);
                let contact = self
                    .engine
                    .get_contact(id)?
                    .ok_or(EngineError::ContactNotFound(id))?;
                let groups = self.engine.groups_of_contact(id)?;
                match format {
                    OutputFormat::Text => Ok(format_contact_detail_text(&contact, &groups)),
                    OutputFormat::Json => render_json(&ApiResponse::ok(
                        "Contact found",
                        json!({ "contact": contact, "groups": groups }),
                    )),
                }
            }
            ContactCommands::List { group } => {
                let contacts = self.engine.list_contacts(group.map(GroupId))?;
                match format {
                    OutputFormat::Text => Ok(format_contact_list_text(&contacts)),
                    OutputFormat::Json => render_json(&ApiResponse::ok(
                        format!("{} contacts", contacts.len()),
                        contacts,
                    )),
                }
            }
            ContactCommands::Delete { ids } => self.run_command(
                Command::DeleteContacts {
                    ids: contact_ids(ids),
                },
                format,
            ),
        }
    }

    fn handle_group_command(
        &self,
        command: &GroupCommands,
        format: OutputFormat,
    ) -> Result<String, EngineError> {
        match command {
            GroupCommands::Add { name, members } => self.run_command(
                Command::CreateGroup {
                    group_name: name.clone(),
                    contact_ids: contact_ids(members),
                },
                format,
            ),
            GroupCommands::Rename { id, name } => self.run_command(
                Command::RenameGroup {
                    id: GroupId(*id),
                    group_name: name.clone(),
                },
                format,
            ),
            GroupCommands::List => {
                let mut rows = Vec::new();
                for group in self.engine.list_groups()? {
                    let members = self.engine.members_of_group(group.id)?.len();
                    rows.push((group, members));
                }
                match format {
                    OutputFormat::Text => Ok(format_group_list_text(&rows)),
                    OutputFormat::Json => {
                        let groups: Vec<_> = rows
                            .iter()
                            .map(|(group, members)| json!({ "group": group, "member_count": members }))
                            .collect();
                        render_json(&ApiResponse::ok(format!("{} groups", groups.len()), groups))
                    }
                }
            }
            GroupCommands::Delete { ids } => self.run_command(
                Command::DeleteGroups {
                    ids: ids.iter().copied().map(GroupId).collect(),
                },
                format,
            ),
            GroupCommands::AddMembers { id, contacts } => self.run_command(
                Command::AddContactsToGroup {
                    group_id: GroupId(*id),
                    contact_ids: contact_ids(contacts),
                },
                format,
            ),
            GroupCommands::RemoveMembers { id, contacts } => self.run_command(
                Command::RemoveContactsFromGroup {
                    group_id: GroupId(*id),
                    contact_ids: contact_ids(contacts),
                },
                format,
            ),
        }
    }

    fn run_command(&self, command: Command, format: OutputFormat) -> Result<String, EngineError> {
        let outcome = self.engine.execute(command)?;
        render_outcome(&outcome, format)
    }
}

fn render_outcome(outcome: &CommandOutcome, format: OutputFormat) -> Result<String, EngineError> {
    match format {
        OutputFormat::Text => Ok(format_outcome_text(outcome)),
        OutputFormat::Json => render_json(&ApiResponse::from_result(&Ok(outcome.clone()))),
    }
}

fn render_json<T: Serialize>(value: &T) -> Result<String, EngineError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| {
            EngineError::StorageFailure(StorageError::Encode {
                what: "response",
                message: e.to_string(),
            })
        })
}

fn contact_fields(args: &ContactArgs) -> ContactFields {
    ContactFields {
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        phone: args.phone.clone(),
        email: args.email.clone(),
        birth_date: args.birth_date,
        owner_id: args.owner_id,
        status: args.status,
    }
}

fn contact_ids(ids: &[u64]) -> ContactIdSet {
    ids.iter().copied().map(ContactId).collect()
}

fn group_ids(ids: &[u64]) -> Vec<GroupId> {
    ids.iter().copied().map(GroupId).collect()
}
