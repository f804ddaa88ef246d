//! Contact and group rows, plus the email/phone unique indexes.

use crate::error::{EngineError, UniqueField};
use crate::store::codec::{decode, encode};
use crate::store::{
    abort, Contact, ContactFields, ContactStore, Group, GroupStore, OrAbort, StoreTx, TxResult,
};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use chrono::{DateTime, Utc};
use tracing::debug;

const UNIQUE_FIELDS: [UniqueField; 2] = [UniqueField::Email, UniqueField::Phone];

impl StoreTx<'_> {
    fn put_contact(&self, contact: &Contact) -> TxResult<()> {
        let value = encode("contact", contact).or_abort()?;
        self.contacts.insert(&contact.id.to_key()[..], value)?;
        Ok(())
    }

    fn put_group(&self, group: &Group) -> TxResult<()> {
        let value = encode("group", group).or_abort()?;
        self.groups.insert(&group.id.to_key()[..], value)?;
        Ok(())
    }

    /// Point `value` at `owner` in the unique index, aborting if another
    /// contact already holds it.
    fn claim_unique(&self, field: UniqueField, value: &str, owner: ContactId) -> TxResult<()> {
        let index = self.unique_index(field);
        if let Some(raw) = index.get(value.as_bytes())? {
            match ContactId::from_key(&raw) {
                Some(existing) if existing == owner => return Ok(()),
                Some(existing) => {
                    return abort(EngineError::Conflict {
                        field,
                        value: value.to_string(),
                        existing,
                    })
                }
                None => {}
            }
        }
        index.insert(value.as_bytes(), &owner.to_key()[..])?;
        Ok(())
    }

    fn release_unique(&self, field: UniqueField, value: &str, owner: ContactId) -> TxResult<()> {
        let index = self.unique_index(field);
        if let Some(raw) = index.get(value.as_bytes())? {
            if ContactId::from_key(&raw) == Some(owner) {
                index.remove(value.as_bytes())?;
            }
        }
        Ok(())
    }
}

impl ContactStore for StoreTx<'_> {
    fn create_contact(
        &self,
        id: ContactId,
        fields: &ContactFields,
        now: DateTime<Utc>,
    ) -> TxResult<Contact> {
        let contact = Contact::from_fields(id, fields, now);
        for field in UNIQUE_FIELDS {
            if let Some(value) = contact.unique_value(field) {
                self.claim_unique(field, value, id)?;
            }
        }
        self.put_contact(&contact)?;
        debug!(contact_id = %id, "Contact row inserted");
        Ok(contact)
    }

    fn update_contact(
        &self,
        id: ContactId,
        fields: &ContactFields,
        now: DateTime<Utc>,
    ) -> TxResult<Contact> {
        let Some(current) = self.get_contact(id)? else {
            return abort(EngineError::ContactNotFound(id));
        };
        let updated = current.clone().with_fields(fields, now);
        for field in UNIQUE_FIELDS {
            let before = current.unique_value(field);
            let after = updated.unique_value(field);
            if before == after {
                continue;
            }
            if let Some(value) = after {
                self.claim_unique(field, value, id)?;
            }
            if let Some(value) = before {
                self.release_unique(field, value, id)?;
            }
        }
        self.put_contact(&updated)?;
        debug!(contact_id = %id, "Contact row updated");
        Ok(updated)
    }

    fn find_contact_by_unique_field(
        &self,
        field: UniqueField,
        value: &str,
    ) -> TxResult<Option<ContactId>> {
        let raw = self.unique_index(field).get(value.as_bytes())?;
        Ok(raw.and_then(|raw| ContactId::from_key(&raw)))
    }

    fn get_contact(&self, id: ContactId) -> TxResult<Option<Contact>> {
        match self.contacts.get(id.to_key())? {
            Some(raw) => decode("contact", &raw).map(Some).or_abort(),
            None => Ok(None),
        }
    }

    fn contact_exists(&self, id: ContactId) -> TxResult<bool> {
        Ok(self.contacts.get(id.to_key())?.is_some())
    }

    fn delete_contacts(&self, ids: &ContactIdSet) -> TxResult<usize> {
        let mut removed = 0;
        for id in ids {
            let Some(contact) = self.get_contact(*id)? else {
                continue;
            };
            for field in UNIQUE_FIELDS {
                if let Some(value) = contact.unique_value(field) {
                    self.release_unique(field, value, *id)?;
                }
            }
            self.contacts.remove(&id.to_key()[..])?;
            removed += 1;
        }
        Ok(removed)
    }
}

impl GroupStore for StoreTx<'_> {
    fn create_group(&self, id: GroupId, group_name: &str, now: DateTime<Utc>) -> TxResult<Group> {
        let group = Group {
            id,
            group_name: group_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.put_group(&group)?;
        debug!(group_id = %id, "Group row inserted");
        Ok(group)
    }

    fn rename_group(&self, id: GroupId, group_name: &str, now: DateTime<Utc>) -> TxResult<Group> {
        let Some(mut group) = self.get_group(id)? else {
            return abort(EngineError::GroupNotFound(id));
        };
        group.group_name = group_name.to_string();
        group.updated_at = now;
        self.put_group(&group)?;
        Ok(group)
    }

    fn get_group(&self, id: GroupId) -> TxResult<Option<Group>> {
        match self.groups.get(id.to_key())? {
            Some(raw) => decode("group", &raw).map(Some).or_abort(),
            None => Ok(None),
        }
    }

    fn group_exists(&self, id: GroupId) -> TxResult<bool> {
        Ok(self.groups.get(id.to_key())?.is_some())
    }

    fn delete_groups(&self, ids: &GroupIdSet) -> TxResult<usize> {
        let mut removed = 0;
        for id in ids {
            if self.groups.remove(&id.to_key()[..])?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
