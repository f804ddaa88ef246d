//! Command boundary: one tagged variant per directory operation.
//!
//! Commands are validated and normalized here, before any transaction opens.

use crate::error::EngineError;
use crate::reconcile::{ContactSaved, GroupSaved, MembersAdded};
use crate::store::{ContactFields, Group};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet, GroupSelection};
use serde::{Deserialize, Serialize};

/// Longest accepted value for any text field.
pub const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    CreateContact {
        #[serde(flatten)]
        fields: ContactFields,
        #[serde(default, alias = "group_id")]
        groups: GroupSelection,
    },
    /// Omitting `groups` keeps the contact's current memberships.
    UpdateContact {
        id: ContactId,
        #[serde(flatten)]
        fields: ContactFields,
        #[serde(default, alias = "group_id", skip_serializing_if = "Option::is_none")]
        groups: Option<GroupSelection>,
    },
    AddContactsToGroup {
        group_id: GroupId,
        contact_ids: ContactIdSet,
    },
    RemoveContactsFromGroup {
        group_id: GroupId,
        contact_ids: ContactIdSet,
    },
    DeleteContacts {
        ids: ContactIdSet,
    },
    DeleteGroups {
        ids: GroupIdSet,
    },
    CreateGroup {
        group_name: String,
        #[serde(default)]
        contact_ids: ContactIdSet,
    },
    RenameGroup {
        id: GroupId,
        group_name: String,
    },
}

/// A command that passed validation, with normalized payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidCommand {
    CreateContact {
        fields: ContactFields,
        groups: GroupIdSet,
    },
    UpdateContact {
        id: ContactId,
        fields: ContactFields,
        groups: Option<GroupIdSet>,
    },
    AddContactsToGroup {
        group_id: GroupId,
        contact_ids: ContactIdSet,
    },
    RemoveContactsFromGroup {
        group_id: GroupId,
        contact_ids: ContactIdSet,
    },
    DeleteContacts {
        ids: ContactIdSet,
    },
    DeleteGroups {
        ids: GroupIdSet,
    },
    CreateGroup {
        group_name: String,
        contact_ids: ContactIdSet,
    },
    RenameGroup {
        id: GroupId,
        group_name: String,
    },
}

impl Command {
    /// Stable operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateContact { .. } => "create_contact",
            Command::UpdateContact { .. } => "update_contact",
            Command::AddContactsToGroup { .. } => "add_contacts_to_group",
            Command::RemoveContactsFromGroup { .. } => "remove_contacts_from_group",
            Command::DeleteContacts { .. } => "delete_contacts",
            Command::DeleteGroups { .. } => "delete_groups",
            Command::CreateGroup { .. } => "create_group",
            Command::RenameGroup { .. } => "rename_group",
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        serde_json::from_str(raw)
            .map_err(|e| EngineError::validation(format!("malformed command: {}", e)))
    }

    pub fn validate(self) -> Result<ValidCommand, EngineError> {
        match self {
            Command::CreateContact { fields, groups } => Ok(ValidCommand::CreateContact {
                fields: validate_fields(fields)?,
                groups: groups.into_set(),
            }),
            Command::UpdateContact { id, fields, groups } => Ok(ValidCommand::UpdateContact {
                id,
                fields: validate_fields(fields)?,
                groups: groups.map(GroupSelection::into_set),
            }),
            Command::AddContactsToGroup {
                group_id,
                contact_ids,
            } => Ok(ValidCommand::AddContactsToGroup {
                group_id,
                contact_ids,
            }),
            Command::RemoveContactsFromGroup {
                group_id,
                contact_ids,
            } => {
                if contact_ids.is_empty() {
                    return Err(EngineError::validation(
                        "contact_ids must name at least one contact",
                    ));
                }
                Ok(ValidCommand::RemoveContactsFromGroup {
                    group_id,
                    contact_ids,
                })
            }
            Command::DeleteContacts { ids } => Ok(ValidCommand::DeleteContacts { ids }),
            Command::DeleteGroups { ids } => Ok(ValidCommand::DeleteGroups { ids }),
            Command::CreateGroup {
                group_name,
                contact_ids,
            } => Ok(ValidCommand::CreateGroup {
                group_name: validate_group_name(&group_name)?,
                contact_ids,
            }),
            Command::RenameGroup { id, group_name } => Ok(ValidCommand::RenameGroup {
                id,
                group_name: validate_group_name(&group_name)?,
            }),
        }
    }
}

pub(crate) fn validate_fields(fields: ContactFields) -> Result<ContactFields, EngineError> {
    let fields = fields.normalized()?;
    for (name, value) in [
        ("first_name", &fields.first_name),
        ("last_name", &fields.last_name),
        ("phone", &fields.phone),
        ("email", &fields.email),
    ] {
        if value.as_ref().is_some_and(|v| v.chars().count() > MAX_TEXT_LEN) {
            return Err(EngineError::validation(format!(
                "{} exceeds {} characters",
                name, MAX_TEXT_LEN
            )));
        }
    }
    Ok(fields)
}

pub(crate) fn validate_group_name(raw: &str) -> Result<String, EngineError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(EngineError::validation("group_name must not be empty"));
    }
    if name.chars().count() > MAX_TEXT_LEN {
        return Err(EngineError::validation(format!(
            "group_name exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(name.to_string())
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    ContactCreated(ContactSaved),
    ContactUpdated(ContactSaved),
    MembersAdded(MembersAdded),
    MembersRemoved { removed_count: usize },
    ContactsDeleted { removed_count: usize },
    GroupsDeleted { removed_count: usize },
    GroupCreated(GroupSaved),
    GroupRenamed(Group),
}

impl CommandOutcome {
    /// Whether the command created a new entity.
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            CommandOutcome::ContactCreated(_) | CommandOutcome::GroupCreated(_)
        )
    }

    pub fn summary(&self) -> String {
        match self {
            CommandOutcome::ContactCreated(saved) | CommandOutcome::ContactUpdated(saved) => format!(
                "Saved contact {} ({} groups, +{} -{})",
                saved.contact.id,
                saved.groups.len(),
                saved.delta.added.len(),
                saved.delta.removed.len()
            ),
            CommandOutcome::MembersAdded(added) if added.inserted_count == 0 => {
                "No new members: every contact was already in the group".to_string()
            }
            CommandOutcome::MembersAdded(added) => {
                format!("Added {} contacts to the group", added.inserted_count)
            }
            CommandOutcome::MembersRemoved { removed_count } => {
                format!("Removed {} contacts from the group", removed_count)
            }
            CommandOutcome::ContactsDeleted { removed_count } => {
                format!("Deleted {} contacts", removed_count)
            }
            CommandOutcome::GroupsDeleted { removed_count } => {
                format!("Deleted {} groups", removed_count)
            }
            CommandOutcome::GroupCreated(saved) => format!(
                "Created group {} with {} members",
                saved.group.id, saved.members.inserted_count
            ),
            CommandOutcome::GroupRenamed(group) => {
                format!("Renamed group {} to '{}'", group.id, group.group_name)
            }
        }
    }
}
