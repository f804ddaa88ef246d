//! Membership index over two mirrored trees.
//!
//! `group_members` maps a group to its contact set and `contact_groups` maps a
//! contact to its group set. Both are written in the same transaction, so they
//! describe one junction relation keyed by `(group_id, contact_id)`.

use crate::reconcile::delta::MembershipDelta;
use crate::store::codec::{decode, encode};
use crate::store::{MembershipIndex, OrAbort, StoreTx, TxResult};
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use std::collections::BTreeMap;

impl StoreTx<'_> {
    fn store_members(&self, group_id: GroupId, members: &ContactIdSet) -> TxResult<()> {
        let key = group_id.to_key();
        if members.is_empty() {
            self.group_members.remove(&key[..])?;
        } else {
            let value = encode("group members", members).or_abort()?;
            self.group_members.insert(&key[..], value)?;
        }
        Ok(())
    }

    fn store_groups_of(&self, contact_id: ContactId, groups: &GroupIdSet) -> TxResult<()> {
        let key = contact_id.to_key();
        if groups.is_empty() {
            self.contact_groups.remove(&key[..])?;
        } else {
            let value = encode("contact groups", groups).or_abort()?;
            self.contact_groups.insert(&key[..], value)?;
        }
        Ok(())
    }

    fn add_group_to_contact(&self, contact_id: ContactId, group_id: GroupId) -> TxResult<()> {
        let mut groups = self.groups_of_contact(contact_id)?;
        if groups.insert(group_id) {
            self.store_groups_of(contact_id, &groups)?;
        }
        Ok(())
    }

    fn drop_group_from_contact(&self, contact_id: ContactId, group_id: GroupId) -> TxResult<()> {
        let mut groups = self.groups_of_contact(contact_id)?;
        if groups.remove(&group_id) {
            self.store_groups_of(contact_id, &groups)?;
        }
        Ok(())
    }
}

impl MembershipIndex for StoreTx<'_> {
    fn list_contact_ids_in_group(
        &self,
        group_id: GroupId,
        candidates: &ContactIdSet,
    ) -> TxResult<ContactIdSet> {
        let members = self.members_of_group(group_id)?;
        Ok(members.intersection(candidates).copied().collect())
    }

    fn insert_pairs(&self, group_id: GroupId, contact_ids: &ContactIdSet) -> TxResult<usize> {
        let mut members = self.members_of_group(group_id)?;
        let mut inserted = 0;
        for contact_id in contact_ids {
            if members.insert(*contact_id) {
                self.add_group_to_contact(*contact_id, group_id)?;
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.store_members(group_id, &members)?;
        }
        Ok(inserted)
    }

    fn delete_by_contact_ids(&self, contact_ids: &ContactIdSet) -> TxResult<usize> {
        let mut by_group: BTreeMap<GroupId, ContactIdSet> = BTreeMap::new();
        for contact_id in contact_ids {
            let groups = self.groups_of_contact(*contact_id)?;
            if groups.is_empty() {
                continue;
            }
            self.store_groups_of(*contact_id, &GroupIdSet::new())?;
            for group_id in groups {
                by_group.entry(group_id).or_default().insert(*contact_id);
            }
        }

        let mut removed = 0;
        for (group_id, leaving) in by_group {
            let mut members = self.members_of_group(group_id)?;
            let before = members.len();
            members.retain(|c| !leaving.contains(c));
            removed += before - members.len();
            self.store_members(group_id, &members)?;
        }
        Ok(removed)
    }

    fn delete_by_group_ids(&self, group_ids: &GroupIdSet) -> TxResult<usize> {
        let mut by_contact: BTreeMap<ContactId, GroupIdSet> = BTreeMap::new();
        for group_id in group_ids {
            let members = self.members_of_group(*group_id)?;
            if members.is_empty() {
                continue;
            }
            self.store_members(*group_id, &ContactIdSet::new())?;
            for contact_id in members {
                by_contact.entry(contact_id).or_default().insert(*group_id);
            }
        }

        let mut removed = 0;
        for (contact_id, leaving) in by_contact {
            let mut groups = self.groups_of_contact(contact_id)?;
            let before = groups.len();
            groups.retain(|g| !leaving.contains(g));
            removed += before - groups.len();
            self.store_groups_of(contact_id, &groups)?;
        }
        Ok(removed)
    }

    fn delete_by_contact_and_group(
        &self,
        contact_ids: &ContactIdSet,
        group_id: GroupId,
    ) -> TxResult<usize> {
        let mut members = self.members_of_group(group_id)?;
        let leaving: ContactIdSet = members.intersection(contact_ids).copied().collect();
        if leaving.is_empty() {
            return Ok(0);
        }
        members.retain(|c| !leaving.contains(c));
        self.store_members(group_id, &members)?;
        for contact_id in &leaving {
            self.drop_group_from_contact(*contact_id, group_id)?;
        }
        Ok(leaving.len())
    }

    fn replace_for_contact(
        &self,
        contact_id: ContactId,
        desired: &GroupIdSet,
    ) -> TxResult<MembershipDelta> {
        let current = self.groups_of_contact(contact_id)?;
        let delta = MembershipDelta::between(&current, desired);
        if delta.is_empty() {
            return Ok(delta);
        }

        for group_id in &delta.removed {
            let mut members = self.members_of_group(*group_id)?;
            members.remove(&contact_id);
            self.store_members(*group_id, &members)?;
        }
        for group_id in &delta.added {
            let mut members = self.members_of_group(*group_id)?;
            members.insert(contact_id);
            self.store_members(*group_id, &members)?;
        }
        self.store_groups_of(contact_id, desired)?;
        Ok(delta)
    }

    fn groups_of_contact(&self, contact_id: ContactId) -> TxResult<GroupIdSet> {
        match self.contact_groups.get(contact_id.to_key())? {
            Some(raw) => decode("contact groups", &raw).or_abort(),
            None => Ok(GroupIdSet::new()),
        }
    }

    fn members_of_group(&self, group_id: GroupId) -> TxResult<ContactIdSet> {
        match self.group_members.get(group_id.to_key())? {
            Some(raw) => decode("group members", &raw).or_abort(),
            None => Ok(ContactIdSet::new()),
        }
    }
}
