//! Read paths over the sled-backed directory.
//!
//! Reads run outside transactions. Each single-key read sees a committed value;
//! a listing may interleave with a concurrent commit but never observes a
//! half-applied one for any single row.

use crate::error::{StorageError, UniqueField};
use crate::store::codec::decode;
use crate::store::{Contact, Group, StoreTrees};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use serde::{Deserialize, Serialize};
use sled::Tree;

/// Read-only handle to the directory trees.
#[derive(Clone)]
pub struct SledDirectory {
    trees: StoreTrees,
}

impl SledDirectory {
    pub fn new(trees: StoreTrees) -> Self {
        Self { trees }
    }

    pub fn get_contact(&self, id: ContactId) -> Result<Option<Contact>, StorageError> {
        read_one(self.trees.contacts(), &id.to_key(), "contact")
    }

    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError> {
        read_one(self.trees.groups(), &id.to_key(), "group")
    }

    /// All contacts in id order, or only members of `group` when given.
    ///
    /// An unknown group yields an empty list.
    pub fn list_contacts(&self, group: Option<GroupId>) -> Result<Vec<Contact>, StorageError> {
        let Some(group_id) = group else {
            return read_all(self.trees.contacts(), "contact");
        };
        let mut contacts = Vec::new();
        for contact_id in self.members_of_group(group_id)? {
            // A member deleted after the set was read is simply skipped.
            if let Some(contact) = self.get_contact(contact_id)? {
                contacts.push(contact);
            }
        }
        Ok(contacts)
    }

    pub fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        read_all(self.trees.groups(), "group")
    }

    pub fn groups_of_contact(&self, id: ContactId) -> Result<GroupIdSet, StorageError> {
        Ok(read_one(self.trees.contact_groups(), &id.to_key(), "contact groups")?
            .unwrap_or_default())
    }

    pub fn members_of_group(&self, id: GroupId) -> Result<ContactIdSet, StorageError> {
        Ok(read_one(self.trees.group_members(), &id.to_key(), "group members")?
            .unwrap_or_default())
    }

    pub fn find_by_unique_field(
        &self,
        field: UniqueField,
        value: &str,
    ) -> Result<Option<ContactId>, StorageError> {
        let index = match field {
            UniqueField::Email => self.trees.email_index(),
            UniqueField::Phone => self.trees.phone_index(),
        };
        Ok(index
            .get(value.as_bytes())?
            .and_then(|raw| ContactId::from_key(&raw)))
    }

    /// Total number of `(group_id, contact_id)` pairs.
    pub fn membership_count(&self) -> Result<usize, StorageError> {
        let mut count = 0;
        for item in self.trees.group_members().iter() {
            let (_, value) = item?;
            let members: ContactIdSet = decode("group members", &value)?;
            count += members.len();
        }
        Ok(count)
    }

    /// Scan every tree and report broken invariants.
    pub fn check_integrity(&self) -> Result<IntegrityReport, StorageError> {
        let mut report = IntegrityReport::default();

        let contact_ids: ContactIdSet = self
            .list_contacts(None)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let group_ids: GroupIdSet = self.list_groups()?.into_iter().map(|g| g.id).collect();
        report.contacts = contact_ids.len();
        report.groups = group_ids.len();

        for item in self.trees.group_members().iter() {
            let (key, value) = item?;
            let Some(group_id) = GroupId::from_key(&key) else {
                report.issues.push(format!("malformed group_members key {:?}", key));
                continue;
            };
            let members: ContactIdSet = decode("group members", &value)?;
            if !group_ids.contains(&group_id) {
                report
                    .issues
                    .push(format!("memberships reference missing group {}", group_id));
            }
            for contact_id in members {
                report.memberships += 1;
                if !contact_ids.contains(&contact_id) {
                    report.issues.push(format!(
                        "group {} references missing contact {}",
                        group_id, contact_id
                    ));
                }
                if !self.groups_of_contact(contact_id)?.contains(&group_id) {
                    report.issues.push(format!(
                        "pair ({}, {}) missing from contact_groups",
                        group_id, contact_id
                    ));
                }
            }
        }

        for item in self.trees.contact_groups().iter() {
            let (key, value) = item?;
            let Some(contact_id) = ContactId::from_key(&key) else {
                report.issues.push(format!("malformed contact_groups key {:?}", key));
                continue;
            };
            let groups: GroupIdSet = decode("contact groups", &value)?;
            for group_id in groups {
                if !self.members_of_group(group_id)?.contains(&contact_id) {
                    report.issues.push(format!(
                        "pair ({}, {}) missing from group_members",
                        group_id, contact_id
                    ));
                }
            }
        }

        for field in [UniqueField::Email, UniqueField::Phone] {
            let index = match field {
                UniqueField::Email => self.trees.email_index(),
                UniqueField::Phone => self.trees.phone_index(),
            };
            for item in index.iter() {
                let (key, value) = item?;
                let value_str = String::from_utf8_lossy(&key).into_owned();
                let owner = ContactId::from_key(&value)
                    .map(|id| self.get_contact(id))
                    .transpose()?
                    .flatten();
                match owner {
                    Some(contact) if contact.unique_value(field) == Some(value_str.as_str()) => {}
                    _ => report.issues.push(format!(
                        "stale {} index entry '{}'",
                        field, value_str
                    )),
                }
            }
        }

        Ok(report)
    }
}

/// Outcome of [`SledDirectory::check_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub contacts: usize,
    pub groups: usize,
    pub memberships: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

fn read_one<T: serde::de::DeserializeOwned>(
    tree: &Tree,
    key: &[u8],
    what: &'static str,
) -> Result<Option<T>, StorageError> {
    match tree.get(key)? {
        Some(raw) => Ok(Some(decode(what, &raw)?)),
        None => Ok(None),
    }
}

fn read_all<T: serde::de::DeserializeOwned>(
    tree: &Tree,
    what: &'static str,
) -> Result<Vec<T>, StorageError> {
    let mut out = Vec::new();
    for item in tree.iter() {
        let (_, value) = item?;
        out.push(decode(what, &value)?);
    }
    Ok(out)
}
