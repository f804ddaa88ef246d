//! Membership Reconciler
//!
//! Turns each directory command into one unit of work: existence and
//! uniqueness checks, the membership delta, and the entity and junction writes
//! all run against the same [`crate::store::StoreTx`]. The step functions are generic over
//! the store traits; [`MembershipReconciler`] wraps each of them in a
//! transaction opened through the [`TransactionCoordinator`].

pub mod delta;

use crate::error::{EngineError, UniqueField};
use crate::reconcile::delta::{pending_members, MembershipDelta};
use crate::store::{
    abort, Contact, ContactFields, ContactStore, Group, GroupStore, MembershipIndex,
    TxResult,
};
use crate::transaction::{CancelToken, TransactionCoordinator};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A contact written together with its reconciled memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSaved {
    pub contact: Contact,
    pub groups: GroupIdSet,
    pub delta: MembershipDelta,
}

/// Result of a bulk add. A zero count is a successful no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersAdded {
    pub inserted_count: usize,
    pub inserted_ids: ContactIdSet,
}

/// A group written together with its initial members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSaved {
    pub group: Group,
    pub members: MembersAdded,
}

/// Abort with a conflict if `fields` would take an email or phone already
/// held by a contact other than `owner`.
pub fn ensure_unique<S: ContactStore>(
    tx: &S,
    fields: &ContactFields,
    owner: Option<ContactId>,
) -> TxResult<()> {
    for field in [UniqueField::Email, UniqueField::Phone] {
        let Some(Some(value)) = fields.unique_value(field) else {
            continue;
        };
        if let Some(existing) = tx.find_contact_by_unique_field(field, value)? {
            if Some(existing) != owner {
                return abort(EngineError::Conflict {
                    field,
                    value: value.to_string(),
                    existing,
                });
            }
        }
    }
    Ok(())
}

pub fn ensure_groups_exist<S: GroupStore>(tx: &S, ids: &GroupIdSet) -> TxResult<()> {
    for id in ids {
        if !tx.group_exists(*id)? {
            return abort(EngineError::GroupNotFound(*id));
        }
    }
    Ok(())
}

pub fn ensure_contacts_exist<S: ContactStore>(tx: &S, ids: &ContactIdSet) -> TxResult<()> {
    for id in ids {
        if !tx.contact_exists(*id)? {
            return abort(EngineError::ContactNotFound(*id));
        }
    }
    Ok(())
}

/// Point the contact's memberships at exactly `groups`.
pub fn reconcile_groups<S: GroupStore + MembershipIndex>(
    tx: &S,
    contact_id: ContactId,
    groups: &GroupIdSet,
) -> TxResult<MembershipDelta> {
    ensure_groups_exist(tx, groups)?;
    let delta = tx.replace_for_contact(contact_id, groups)?;
    debug!(
        contact_id = %contact_id,
        added = delta.added.len(),
        removed = delta.removed.len(),
        "Membership reconciled"
    );
    Ok(delta)
}

pub fn create_contact_step<S>(
    tx: &S,
    id: ContactId,
    fields: &ContactFields,
    groups: &GroupIdSet,
    now: DateTime<Utc>,
) -> TxResult<ContactSaved>
where
    S: ContactStore + GroupStore + MembershipIndex,
{
    ensure_unique(tx, fields, None)?;
    let contact = tx.create_contact(id, fields, now)?;
    let delta = reconcile_groups(tx, id, groups)?;
    Ok(ContactSaved {
        contact,
        groups: groups.clone(),
        delta,
    })
}

/// Patch a contact. `None` for `groups` keeps its current memberships, read
/// in the same transaction as the write.
pub fn update_contact_step<S>(
    tx: &S,
    id: ContactId,
    fields: &ContactFields,
    groups: Option<&GroupIdSet>,
    now: DateTime<Utc>,
) -> TxResult<ContactSaved>
where
    S: ContactStore + GroupStore + MembershipIndex,
{
    if !tx.contact_exists(id)? {
        return abort(EngineError::ContactNotFound(id));
    }
    ensure_unique(tx, fields, Some(id))?;
    let contact = tx.update_contact(id, fields, now)?;
    let groups = match groups {
        Some(groups) => groups.clone(),
        None => tx.groups_of_contact(id)?,
    };
    let delta = reconcile_groups(tx, id, &groups)?;
    Ok(ContactSaved {
        contact,
        groups,
        delta,
    })
}

/// Link existing contacts to a group, skipping those already linked.
pub fn add_members_step<S>(tx: &S, group_id: GroupId, requested: &ContactIdSet) -> TxResult<MembersAdded>
where
    S: ContactStore + GroupStore + MembershipIndex,
{
    if !tx.group_exists(group_id)? {
        return abort(EngineError::GroupNotFound(group_id));
    }
    let already = tx.list_contact_ids_in_group(group_id, requested)?;
    let to_insert = pending_members(requested, &already);
    if to_insert.is_empty() {
        debug!(group_id = %group_id, requested = requested.len(), "All contacts already members");
        return Ok(MembersAdded::default());
    }
    ensure_contacts_exist(tx, &to_insert)?;
    let inserted_count = tx.insert_pairs(group_id, &to_insert)?;
    Ok(MembersAdded {
        inserted_count,
        inserted_ids: to_insert,
    })
}

pub fn remove_members_step<S>(tx: &S, group_id: GroupId, contact_ids: &ContactIdSet) -> TxResult<usize>
where
    S: GroupStore + MembershipIndex,
{
    if !tx.group_exists(group_id)? {
        return abort(EngineError::GroupNotFound(group_id));
    }
    tx.delete_by_contact_and_group(contact_ids, group_id)
}

/// Remove contacts and every membership that references them.
pub fn delete_contacts_step<S>(tx: &S, ids: &ContactIdSet) -> TxResult<usize>
where
    S: ContactStore + MembershipIndex,
{
    let pairs = tx.delete_by_contact_ids(ids)?;
    let removed = tx.delete_contacts(ids)?;
    debug!(requested = ids.len(), removed, pairs, "Contacts deleted");
    Ok(removed)
}

/// Remove groups and every membership that references them.
pub fn delete_groups_step<S>(tx: &S, ids: &GroupIdSet) -> TxResult<usize>
where
    S: GroupStore + MembershipIndex,
{
    let pairs = tx.delete_by_group_ids(ids)?;
    let removed = tx.delete_groups(ids)?;
    debug!(requested = ids.len(), removed, pairs, "Groups deleted");
    Ok(removed)
}

pub fn create_group_step<S>(
    tx: &S,
    id: GroupId,
    group_name: &str,
    members: &ContactIdSet,
    now: DateTime<Utc>,
) -> TxResult<GroupSaved>
where
    S: ContactStore + GroupStore + MembershipIndex,
{
    let group = tx.create_group(id, group_name, now)?;
    let members = add_members_step(tx, id, members)?;
    Ok(GroupSaved { group, members })
}

/// Runs reconciliation steps inside coordinator-managed transactions.
#[derive(Clone)]
pub struct MembershipReconciler {
    db: sled::Db,
    coordinator: TransactionCoordinator,
}

impl MembershipReconciler {
    pub fn new(db: sled::Db, coordinator: TransactionCoordinator) -> Self {
        Self { db, coordinator }
    }

    /// Allocate an id outside the transaction so retries reuse it.
    fn next_id(&self) -> Result<u64, EngineError> {
        Ok(self.db.generate_id()? + 1)
    }

    pub fn create_contact(
        &self,
        fields: &ContactFields,
        groups: &GroupIdSet,
        cancel: &CancelToken,
    ) -> Result<ContactSaved, EngineError> {
        let id = ContactId(self.next_id()?);
        let now = Utc::now();
        let saved = self.coordinator.run("create_contact", cancel, |tx| {
            create_contact_step(tx, id, fields, groups, now)
        })?;
        info!(contact_id = %id, groups = saved.groups.len(), "Contact created");
        Ok(saved)
    }

    pub fn update_contact(
        &self,
        id: ContactId,
        fields: &ContactFields,
        groups: Option<&GroupIdSet>,
        cancel: &CancelToken,
    ) -> Result<ContactSaved, EngineError> {
        let now = Utc::now();
        let saved = self.coordinator.run("update_contact", cancel, |tx| {
            update_contact_step(tx, id, fields, groups, now)
        })?;
        info!(
            contact_id = %id,
            added = saved.delta.added.len(),
            removed = saved.delta.removed.len(),
            "Contact updated"
        );
        Ok(saved)
    }

    pub fn add_contacts_to_group(
        &self,
        group_id: GroupId,
        contact_ids: &ContactIdSet,
        cancel: &CancelToken,
    ) -> Result<MembersAdded, EngineError> {
        let added = self.coordinator.run("add_contacts_to_group", cancel, |tx| {
            add_members_step(tx, group_id, contact_ids)
        })?;
        info!(
            group_id = %group_id,
            requested = contact_ids.len(),
            inserted = added.inserted_count,
            "Contacts added to group"
        );
        Ok(added)
    }

    pub fn remove_contacts_from_group(
        &self,
        group_id: GroupId,
        contact_ids: &ContactIdSet,
        cancel: &CancelToken,
    ) -> Result<usize, EngineError> {
        let removed = self
            .coordinator
            .run("remove_contacts_from_group", cancel, |tx| {
                remove_members_step(tx, group_id, contact_ids)
            })?;
        info!(
            group_id = %group_id,
            requested = contact_ids.len(),
            removed,
            "Contacts removed from group"
        );
        Ok(removed)
    }

    pub fn delete_contacts(&self, ids: &ContactIdSet, cancel: &CancelToken) -> Result<usize, EngineError> {
        let removed = self.coordinator.run("delete_contacts", cancel, |tx| {
            delete_contacts_step(tx, ids)
        })?;
        info!(requested = ids.len(), removed, "Contacts deleted");
        Ok(removed)
    }

    pub fn delete_groups(&self, ids: &GroupIdSet, cancel: &CancelToken) -> Result<usize, EngineError> {
        let removed = self.coordinator.run("delete_groups", cancel, |tx| {
            delete_groups_step(tx, ids)
        })?;
        info!(requested = ids.len(), removed, "Groups deleted");
        Ok(removed)
    }

    pub fn create_group(
        &self,
        group_name: &str,
        members: &ContactIdSet,
        cancel: &CancelToken,
    ) -> Result<GroupSaved, EngineError> {
        let id = GroupId(self.next_id()?);
        let now = Utc::now();
        let saved = self.coordinator.run("create_group", cancel, |tx| {
            create_group_step(tx, id, group_name, members, now)
        })?;
        info!(group_id = %id, members = saved.members.inserted_count, "Group created");
        Ok(saved)
    }

    pub fn rename_group(
        &self,
        id: GroupId,
        group_name: &str,
        cancel: &CancelToken,
    ) -> Result<Group, EngineError> {
        let now = Utc::now();
        let group = self.coordinator.run("rename_group", cancel, |tx| {
            tx.rename_group(id, group_name, now)
        })?;
        info!(group_id = %id, "Group renamed");
        Ok(group)
    }
}
