//! Directory Engine
//!
//! Entry point for callers: validates commands, routes them through the
//! membership reconciler, and serves read paths. The engine owns an explicit
//! sled handle, so independent instances (one per test, one per workspace)
//! never share state.

use crate::command::{self, Command, CommandOutcome, ValidCommand};
use crate::config::RosterConfig;
use crate::error::{EngineError, StorageError};
use crate::reconcile::{ContactSaved, GroupSaved, MembersAdded, MembershipReconciler};
use crate::store::{Contact, ContactFields, Group, IntegrityReport, SledDirectory, StoreTrees};
use crate::transaction::{CancelToken, TransactionConfig, TransactionCoordinator};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use std::path::Path;
use tracing::{debug, info};

/// Contact directory engine.
#[derive(Clone)]
pub struct Engine {
    db: sled::Db,
    directory: SledDirectory,
    reconciler: MembershipReconciler,
}

impl Engine {
    /// Wrap an already opened database.
    pub fn from_db(db: sled::Db, transaction: TransactionConfig) -> Result<Self, EngineError> {
        Self::build(db, transaction, false)
    }

    fn build(
        db: sled::Db,
        transaction: TransactionConfig,
        flush_on_commit: bool,
    ) -> Result<Self, EngineError> {
        transaction.validate().map_err(EngineError::ConfigError)?;
        let trees = StoreTrees::open(&db)?;
        let coordinator = TransactionCoordinator::new(db.clone(), trees.clone(), transaction)
            .with_flush_on_commit(flush_on_commit);
        Ok(Self {
            directory: SledDirectory::new(trees),
            reconciler: MembershipReconciler::new(db.clone(), coordinator),
            db,
        })
    }

    /// Open (or create) a store at `path` with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let db = open_db(path.as_ref())?;
        Self::from_db(db, TransactionConfig::default())
    }

    /// Open the store described by `config`, resolving relative paths
    /// against `workspace_root`.
    pub fn open_with_config(config: &RosterConfig, workspace_root: &Path) -> Result<Self, EngineError> {
        let store_path = config.storage.resolve_path(workspace_root)?;
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let db = open_db(&store_path)?;
        let engine = Self::build(
            db,
            config.transaction.clone(),
            config.storage.flush_on_commit,
        )?;
        info!(store = %store_path.display(), "Directory store opened");
        Ok(engine)
    }

    pub fn directory(&self) -> &SledDirectory {
        &self.directory
    }

    /// Validate and run one command.
    pub fn execute(&self, command: Command) -> Result<CommandOutcome, EngineError> {
        self.execute_with_cancel(command, &CancelToken::new())
    }

    /// Validate and run one command; flipping `cancel` before commit rolls it back.
    pub fn execute_with_cancel(
        &self,
        command: Command,
        cancel: &CancelToken,
    ) -> Result<CommandOutcome, EngineError> {
        let name = command.name();
        debug!(command = name, "Executing command");
        let outcome = match command.validate()? {
            ValidCommand::CreateContact { fields, groups } => CommandOutcome::ContactCreated(
                self.reconciler.create_contact(&fields, &groups, cancel)?,
            ),
            ValidCommand::UpdateContact { id, fields, groups } => CommandOutcome::ContactUpdated(
                self.reconciler.update_contact(id, &fields, groups.as_ref(), cancel)?,
            ),
            ValidCommand::AddContactsToGroup {
                group_id,
                contact_ids,
            } => CommandOutcome::MembersAdded(
                self.reconciler
                    .add_contacts_to_group(group_id, &contact_ids, cancel)?,
            ),
            ValidCommand::RemoveContactsFromGroup {
                group_id,
                contact_ids,
            } => CommandOutcome::MembersRemoved {
                removed_count: self
                    .reconciler
                    .remove_contacts_from_group(group_id, &contact_ids, cancel)?,
            },
            ValidCommand::DeleteContacts { ids } => CommandOutcome::ContactsDeleted {
                removed_count: self.reconciler.delete_contacts(&ids, cancel)?,
            },
            ValidCommand::DeleteGroups { ids } => CommandOutcome::GroupsDeleted {
                removed_count: self.reconciler.delete_groups(&ids, cancel)?,
            },
            ValidCommand::CreateGroup {
                group_name,
                contact_ids,
            } => CommandOutcome::GroupCreated(self.reconciler.create_group(
                &group_name,
                &contact_ids,
                cancel,
            )?),
            ValidCommand::RenameGroup { id, group_name } => {
                CommandOutcome::GroupRenamed(self.reconciler.rename_group(id, &group_name, cancel)?)
            }
        };
        Ok(outcome)
    }

    pub fn create_contact(
        &self,
        fields: ContactFields,
        groups: &GroupIdSet,
    ) -> Result<ContactId, EngineError> {
        let fields = command::validate_fields(fields)?;
        let saved = self
            .reconciler
            .create_contact(&fields, groups, &CancelToken::new())?;
        Ok(saved.contact.id)
    }

    pub fn update_contact(
        &self,
        id: ContactId,
        fields: ContactFields,
        groups: &GroupIdSet,
    ) -> Result<ContactSaved, EngineError> {
        let fields = command::validate_fields(fields)?;
        self.reconciler
            .update_contact(id, &fields, Some(groups), &CancelToken::new())
    }

    pub fn add_contacts_to_group(
        &self,
        group_id: GroupId,
        contact_ids: &ContactIdSet,
    ) -> Result<MembersAdded, EngineError> {
        self.reconciler
            .add_contacts_to_group(group_id, contact_ids, &CancelToken::new())
    }

    pub fn remove_contacts_from_group(
        &self,
        group_id: GroupId,
        contact_ids: &ContactIdSet,
    ) -> Result<usize, EngineError> {
        if contact_ids.is_empty() {
            return Err(EngineError::validation(
                "contact_ids must name at least one contact",
            ));
        }
        self.reconciler
            .remove_contacts_from_group(group_id, contact_ids, &CancelToken::new())
    }

    pub fn delete_contacts(&self, ids: &ContactIdSet) -> Result<usize, EngineError> {
        self.reconciler.delete_contacts(ids, &CancelToken::new())
    }

    pub fn delete_groups(&self, ids: &GroupIdSet) -> Result<usize, EngineError> {
        self.reconciler.delete_groups(ids, &CancelToken::new())
    }

    pub fn create_group(
        &self,
        group_name: &str,
        contact_ids: &ContactIdSet,
    ) -> Result<GroupSaved, EngineError> {
        let group_name = command::validate_group_name(group_name)?;
        self.reconciler
            .create_group(&group_name, contact_ids, &CancelToken::new())
    }

    pub fn rename_group(&self, id: GroupId, group_name: &str) -> Result<Group, EngineError> {
        let group_name = command::validate_group_name(group_name)?;
        self.reconciler
            .rename_group(id, &group_name, &CancelToken::new())
    }

    pub fn get_contact(&self, id: ContactId) -> Result<Option<Contact>, EngineError> {
        Ok(self.directory.get_contact(id)?)
    }

    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>, EngineError> {
        Ok(self.directory.get_group(id)?)
    }

    pub fn list_contacts(&self, group: Option<GroupId>) -> Result<Vec<Contact>, EngineError> {
        Ok(self.directory.list_contacts(group)?)
    }

    pub fn list_groups(&self) -> Result<Vec<Group>, EngineError> {
        Ok(self.directory.list_groups()?)
    }

    pub fn groups_of_contact(&self, id: ContactId) -> Result<GroupIdSet, EngineError> {
        Ok(self.directory.groups_of_contact(id)?)
    }

    pub fn members_of_group(&self, id: GroupId) -> Result<ContactIdSet, EngineError> {
        Ok(self.directory.members_of_group(id)?)
    }

    pub fn check_integrity(&self) -> Result<IntegrityReport, EngineError> {
        Ok(self.directory.check_integrity()?)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), EngineError> {
        self.db.flush()?;
        Ok(())
    }
}

fn open_db(path: &Path) -> Result<sled::Db, EngineError> {
    sled::open(path).map_err(|e| {
        EngineError::StorageFailure(StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to open sled database at {}: {}", path.display(), e),
        )))
    })
}
