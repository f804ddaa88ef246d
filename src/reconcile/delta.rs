//! Set arithmetic behind reconciliation and dedup.

use crate::types::{ContactIdSet, GroupIdSet};
use serde::{Deserialize, Serialize};

/// Changes needed to move a contact from its current groups to the desired ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipDelta {
    pub added: GroupIdSet,
    pub removed: GroupIdSet,
}

impl MembershipDelta {
    pub fn between(current: &GroupIdSet, desired: &GroupIdSet) -> Self {
        Self {
            added: desired.difference(current).copied().collect(),
            removed: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Contacts from `requested` that are not yet in `already`.
pub fn pending_members(requested: &ContactIdSet, already: &ContactIdSet) -> ContactIdSet {
    requested.difference(already).copied().collect()
}
