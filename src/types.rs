//! Identifier types shared across the store, reconciler and command layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Big-endian key bytes, so sled iteration follows id order.
            pub fn to_key(self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            pub fn from_key(bytes: &[u8]) -> Option<Self> {
                let raw: [u8; 8] = bytes.try_into().ok()?;
                Some(Self(u64::from_be_bytes(raw)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

store_id!(
    /// Store-assigned contact identity.
    ContactId
);
store_id!(
    /// Store-assigned group identity.
    GroupId
);

/// Ordered set of contact ids, as carried by bulk commands.
pub type ContactIdSet = BTreeSet<ContactId>;

/// Ordered set of group ids.
pub type GroupIdSet = BTreeSet<GroupId>;

/// Target group selection as accepted at the command boundary.
///
/// Older callers send a single `group_id`; newer ones send a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSelection {
    One(GroupId),
    Many(Vec<GroupId>),
}

impl Default for GroupSelection {
    fn default() -> Self {
        GroupSelection::Many(Vec::new())
    }
}

impl GroupSelection {
    pub fn into_set(self) -> GroupIdSet {
        match self {
            GroupSelection::One(id) => BTreeSet::from([id]),
            GroupSelection::Many(ids) => ids.into_iter().collect(),
        }
    }
}
