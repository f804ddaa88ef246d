//! Contact Store
//!
//! Durable records for contacts, groups and the membership relation between them.
//! Every mutation goes through [`StoreTx`], a view over one sled multi-tree
//! transaction, so a reconciliation either commits as a whole or not at all.

pub mod codec;
pub mod entities;
pub mod membership;
pub mod persistence;

pub use persistence::{IntegrityReport, SledDirectory};

use crate::error::{EngineError, StorageError, UniqueField};
use crate::reconcile::delta::MembershipDelta;
use crate::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree};
use sled::{Db, Tree};

const TREE_CONTACTS: &str = "contacts";
const TREE_GROUPS: &str = "groups";
const TREE_EMAIL_INDEX: &str = "contact_email_idx";
const TREE_PHONE_INDEX: &str = "contact_phone_idx";
const TREE_GROUP_MEMBERS: &str = "group_members";
const TREE_CONTACT_GROUPS: &str = "contact_groups";

/// Slot order of the trees inside a transaction view.
const TREE_NAMES: [&str; 6] = [
    TREE_CONTACTS,
    TREE_GROUPS,
    TREE_EMAIL_INDEX,
    TREE_PHONE_INDEX,
    TREE_GROUP_MEMBERS,
    TREE_CONTACT_GROUPS,
];

/// Result type of every operation running inside a store transaction.
pub type TxResult<T> = ConflictableTransactionResult<T, EngineError>;

/// Abort the surrounding transaction with `err`.
pub fn abort<T>(err: impl Into<EngineError>) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err.into()))
}

/// Lift a non-transactional result into the transaction, aborting on error.
pub(crate) trait OrAbort<T> {
    fn or_abort(self) -> TxResult<T>;
}

impl<T, E: Into<EngineError>> OrAbort<T> for Result<T, E> {
    fn or_abort(self) -> TxResult<T> {
        self.map_err(|e| ConflictableTransactionError::Abort(e.into()))
    }
}

/// Contact record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub owner_id: Option<u64>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact payload for create and update.
///
/// `None` leaves a field untouched on update. For text fields an empty string
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub status: Option<bool>,
}

impl ContactFields {
    /// Trim text, lowercase email, and reject shapes that would corrupt the
    /// unique indexes.
    pub fn normalized(self) -> Result<Self, EngineError> {
        let email = self.email.map(|e| e.trim().to_ascii_lowercase());
        if let Some(email) = email.as_deref().filter(|e| !e.is_empty()) {
            validate_email(email)?;
        }
        let phone = self.phone.map(|p| p.trim().to_string());
        if let Some(phone) = phone.as_deref().filter(|p| !p.is_empty()) {
            validate_phone(phone)?;
        }
        Ok(Self {
            first_name: self.first_name.map(|s| s.trim().to_string()),
            last_name: self.last_name.map(|s| s.trim().to_string()),
            phone,
            email,
            birth_date: self.birth_date,
            owner_id: self.owner_id,
            status: self.status,
        })
    }

    /// Value this payload would store for a unique field, if it sets one.
    ///
    /// `Some(None)` means the payload clears the field.
    pub fn unique_value(&self, field: UniqueField) -> Option<Option<&str>> {
        let raw = match field {
            UniqueField::Email => self.email.as_deref(),
            UniqueField::Phone => self.phone.as_deref(),
        };
        raw.map(|v| Some(v).filter(|v| !v.is_empty()))
    }
}

fn validate_email(email: &str) -> Result<(), EngineError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EngineError::validation(format!("invalid email '{}'", email)))
    }
}

fn validate_phone(phone: &str) -> Result<(), EngineError> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if allowed && phone.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(EngineError::validation(format!("invalid phone '{}'", phone)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Contact {
    /// Build a fresh record from a normalized payload.
    pub fn from_fields(id: ContactId, fields: &ContactFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: non_empty(fields.first_name.clone()),
            last_name: non_empty(fields.last_name.clone()),
            phone: non_empty(fields.phone.clone()),
            email: non_empty(fields.email.clone()),
            birth_date: fields.birth_date,
            owner_id: fields.owner_id,
            status: fields.status.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields present in `fields`; everything else is kept.
    pub fn with_fields(mut self, fields: &ContactFields, now: DateTime<Utc>) -> Self {
        if let Some(v) = &fields.first_name {
            self.first_name = non_empty(Some(v.clone()));
        }
        if let Some(v) = &fields.last_name {
            self.last_name = non_empty(Some(v.clone()));
        }
        if let Some(v) = &fields.phone {
            self.phone = non_empty(Some(v.clone()));
        }
        if let Some(v) = &fields.email {
            self.email = non_empty(Some(v.clone()));
        }
        if fields.birth_date.is_some() {
            self.birth_date = fields.birth_date;
        }
        if fields.owner_id.is_some() {
            self.owner_id = fields.owner_id;
        }
        if let Some(status) = fields.status {
            self.status = status;
        }
        self.updated_at = now;
        self
    }

    pub fn unique_value(&self, field: UniqueField) -> Option<&str> {
        match field {
            UniqueField::Email => self.email.as_deref(),
            UniqueField::Phone => self.phone.as_deref(),
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Entity persistence for contacts.
pub trait ContactStore {
    /// Insert a new contact; aborts with a conflict if email or phone is taken.
    fn create_contact(
        &self,
        id: ContactId,
        fields: &ContactFields,
        now: DateTime<Utc>,
    ) -> TxResult<Contact>;

    /// Overwrite the listed fields; aborts with not-found if the row is absent.
    fn update_contact(
        &self,
        id: ContactId,
        fields: &ContactFields,
        now: DateTime<Utc>,
    ) -> TxResult<Contact>;

    fn find_contact_by_unique_field(
        &self,
        field: UniqueField,
        value: &str,
    ) -> TxResult<Option<ContactId>>;

    fn get_contact(&self, id: ContactId) -> TxResult<Option<Contact>>;

    fn contact_exists(&self, id: ContactId) -> TxResult<bool>;

    /// Delete every contact in `ids` that exists; returns how many were removed.
    fn delete_contacts(&self, ids: &ContactIdSet) -> TxResult<usize>;
}

/// Entity persistence for groups.
pub trait GroupStore {
    fn create_group(&self, id: GroupId, group_name: &str, now: DateTime<Utc>) -> TxResult<Group>;

    fn rename_group(&self, id: GroupId, group_name: &str, now: DateTime<Utc>) -> TxResult<Group>;

    fn get_group(&self, id: GroupId) -> TxResult<Option<Group>>;

    fn group_exists(&self, id: GroupId) -> TxResult<bool>;

    fn delete_groups(&self, ids: &GroupIdSet) -> TxResult<usize>;
}

/// The junction relation between groups and contacts.
///
/// A pair is stored as set membership under both endpoints, so it can occur
/// at most once regardless of what callers submit.
pub trait MembershipIndex {
    /// Subset of `candidates` already linked to `group_id`.
    fn list_contact_ids_in_group(
        &self,
        group_id: GroupId,
        candidates: &ContactIdSet,
    ) -> TxResult<ContactIdSet>;

    /// Link every id to `group_id`; returns the number of pairs actually added.
    fn insert_pairs(&self, group_id: GroupId, contact_ids: &ContactIdSet) -> TxResult<usize>;

    fn delete_by_contact_ids(&self, contact_ids: &ContactIdSet) -> TxResult<usize>;

    fn delete_by_group_ids(&self, group_ids: &GroupIdSet) -> TxResult<usize>;

    fn delete_by_contact_and_group(
        &self,
        contact_ids: &ContactIdSet,
        group_id: GroupId,
    ) -> TxResult<usize>;

    /// Make the contact's memberships exactly `desired`.
    fn replace_for_contact(
        &self,
        contact_id: ContactId,
        desired: &GroupIdSet,
    ) -> TxResult<MembershipDelta>;

    fn groups_of_contact(&self, contact_id: ContactId) -> TxResult<GroupIdSet>;

    fn members_of_group(&self, group_id: GroupId) -> TxResult<ContactIdSet>;
}

/// Handles to every tree the directory uses.
#[derive(Clone)]
pub struct StoreTrees {
    trees: Vec<Tree>,
}

impl StoreTrees {
    pub fn open(db: &Db) -> Result<Self, StorageError> {
        let trees = TREE_NAMES
            .iter()
            .map(|name| db.open_tree(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees })
    }

    pub fn contacts(&self) -> &Tree {
        &self.trees[0]
    }

    pub fn groups(&self) -> &Tree {
        &self.trees[1]
    }

    pub fn email_index(&self) -> &Tree {
        &self.trees[2]
    }

    pub fn phone_index(&self) -> &Tree {
        &self.trees[3]
    }

    pub fn group_members(&self) -> &Tree {
        &self.trees[4]
    }

    pub fn contact_groups(&self) -> &Tree {
        &self.trees[5]
    }

    /// All trees in slot order, for opening one transaction across them.
    pub(crate) fn as_slice(&self) -> &[Tree] {
        &self.trees
    }
}

/// One transaction's view of the directory.
///
/// Nested reconciliation steps share the same `StoreTx`, which is what makes
/// a whole command a single unit of work.
pub struct StoreTx<'a> {
    pub(crate) contacts: &'a TransactionalTree,
    pub(crate) groups: &'a TransactionalTree,
    pub(crate) email_index: &'a TransactionalTree,
    pub(crate) phone_index: &'a TransactionalTree,
    pub(crate) group_members: &'a TransactionalTree,
    pub(crate) contact_groups: &'a TransactionalTree,
}

impl<'a> StoreTx<'a> {
    /// Wrap a transaction view produced from [`StoreTrees::as_slice`].
    pub(crate) fn from_view(view: &'a [TransactionalTree]) -> Self {
        Self {
            contacts: &view[0],
            groups: &view[1],
            email_index: &view[2],
            phone_index: &view[3],
            group_members: &view[4],
            contact_groups: &view[5],
        }
    }

    pub(crate) fn unique_index(&self, field: UniqueField) -> &'a TransactionalTree {
        match field {
            UniqueField::Email => self.email_index,
            UniqueField::Phone => self.phone_index,
        }
    }
}
