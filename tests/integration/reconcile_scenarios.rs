//! Membership reconciliation scenarios through the engine API

use super::test_utils::{
    assert_consistent, contact_set, fields, group_set, new_contact, new_group, open_engine,
};
use roster::error::{EngineError, ErrorKind, UniqueField};
use roster::store::ContactFields;
use roster::types::{ContactId, GroupId, GroupIdSet};
use roster::{Command, CommandOutcome};

#[test]
fn test_bulk_add_is_idempotent() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "Friends");
    let ann = new_contact(&engine, "Ann");
    let bob = new_contact(&engine, "Bob");

    let first = engine
        .add_contacts_to_group(group, &contact_set([ann, bob]))
        .unwrap();
    assert_eq!(first.inserted_count, 2);
    assert_eq!(first.inserted_ids, contact_set([ann, bob]));

    let second = engine
        .add_contacts_to_group(group, &contact_set([ann, bob]))
        .unwrap();
    assert_eq!(second.inserted_count, 0);
    assert!(second.inserted_ids.is_empty());

    assert_eq!(engine.members_of_group(group).unwrap(), contact_set([ann, bob]));
    assert_eq!(engine.directory().membership_count().unwrap(), 2);
    assert_consistent(&engine);
}

#[test]
fn test_bulk_add_inserts_only_missing_members() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "Team");
    let ann = new_contact(&engine, "Ann");
    let bob = new_contact(&engine, "Bob");
    let cat = new_contact(&engine, "Cat");
    engine.add_contacts_to_group(group, &contact_set([ann])).unwrap();

    let added = engine
        .add_contacts_to_group(group, &contact_set([ann, bob, cat]))
        .unwrap();
    assert_eq!(added.inserted_count, 2);
    assert_eq!(added.inserted_ids, contact_set([bob, cat]));
}

#[test]
fn test_bulk_add_to_missing_group_is_not_found() {
    let (_temp, engine) = open_engine();
    let ann = new_contact(&engine, "Ann");

    let err = engine
        .add_contacts_to_group(GroupId(404), &contact_set([ann]))
        .unwrap_err();
    assert!(matches!(err, EngineError::GroupNotFound(GroupId(404))));
    assert_eq!(err.to_string(), "Group not found: 404");
}

#[test]
fn test_bulk_add_unknown_contact_inserts_nothing() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "Team");
    let ann = new_contact(&engine, "Ann");

    let err = engine
        .add_contacts_to_group(group, &contact_set([ann, ContactId(999)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(engine.members_of_group(group).unwrap().is_empty());
    assert!(engine.groups_of_contact(ann).unwrap().is_empty());
}

#[test]
fn test_remove_tolerates_non_members() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "G1");
    let one = new_contact(&engine, "One");
    let two = new_contact(&engine, "Two");
    let three = new_contact(&engine, "Three");
    let four = new_contact(&engine, "Four");
    engine
        .add_contacts_to_group(group, &contact_set([one, two, three]))
        .unwrap();

    let removed = engine
        .remove_contacts_from_group(group, &contact_set([two, four]))
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(engine.members_of_group(group).unwrap(), contact_set([one, three]));
    assert_consistent(&engine);
}

#[test]
fn test_remove_with_empty_set_is_validation_error() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "G1");

    let err = engine
        .remove_contacts_from_group(group, &Default::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_update_replaces_group_set() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let g2 = new_group(&engine, "G2");
    let g3 = new_group(&engine, "G3");
    let contact = engine
        .create_contact(fields("Eve", "eve@example.com"), &group_set([g1, g3]))
        .unwrap();

    let saved = engine
        .update_contact(contact, ContactFields::default(), &group_set([g2]))
        .unwrap();
    assert_eq!(saved.delta.added, group_set([g2]));
    assert_eq!(saved.delta.removed, group_set([g1, g3]));
    assert_eq!(engine.groups_of_contact(contact).unwrap(), group_set([g2]));
    assert!(engine.members_of_group(g1).unwrap().is_empty());
    assert!(engine.members_of_group(g3).unwrap().is_empty());
    assert_consistent(&engine);
}

#[test]
fn test_update_with_empty_groups_clears_memberships() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let contact = engine
        .create_contact(fields("Eve", "eve@example.com"), &group_set([g1]))
        .unwrap();

    engine
        .update_contact(contact, ContactFields::default(), &GroupIdSet::new())
        .unwrap();
    assert!(engine.groups_of_contact(contact).unwrap().is_empty());
    assert!(engine.members_of_group(g1).unwrap().is_empty());
}

#[test]
fn test_update_without_groups_keeps_membership_added_after_it_was_built() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let g2 = new_group(&engine, "G2");
    let contact = engine
        .create_contact(fields("Eve", "eve@example.com"), &group_set([g1]))
        .unwrap();

    let update = Command::UpdateContact {
        id: contact,
        fields: ContactFields {
            last_name: Some("Stone".to_string()),
            ..Default::default()
        },
        groups: None,
    };
    engine
        .add_contacts_to_group(g2, &contact_set([contact]))
        .unwrap();
    let outcome = engine.execute(update).unwrap();

    let CommandOutcome::ContactUpdated(saved) = outcome else {
        panic!("expected contact_updated");
    };
    assert_eq!(saved.groups, group_set([g1, g2]));
    assert!(saved.delta.is_empty());
    assert_eq!(engine.groups_of_contact(contact).unwrap(), group_set([g1, g2]));
    assert_consistent(&engine);
}

#[test]
fn test_update_of_missing_contact_does_not_reveal_email_owner() {
    let (_temp, engine) = open_engine();
    engine
        .create_contact(fields("Ann", "a@x.com"), &GroupIdSet::new())
        .unwrap();

    let err = engine
        .update_contact(ContactId(9_999), fields("Mallory", "a@x.com"), &GroupIdSet::new())
        .unwrap_err();
    assert!(matches!(err, EngineError::ContactNotFound(ContactId(9_999))));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_repeated_update_is_a_no_op() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let contact = new_contact(&engine, "Eve");
    let update = ContactFields {
        last_name: Some("Stone".to_string()),
        ..Default::default()
    };

    engine
        .update_contact(contact, update.clone(), &group_set([g1]))
        .unwrap();
    let again = engine
        .update_contact(contact, update, &group_set([g1]))
        .unwrap();
    assert!(again.delta.is_empty());
    assert_eq!(again.contact.last_name.as_deref(), Some("Stone"));
    assert_eq!(engine.directory().membership_count().unwrap(), 1);
}

#[test]
fn test_duplicate_email_is_conflict() {
    let (_temp, engine) = open_engine();
    let first = engine
        .create_contact(fields("Ann", "ann@example.com"), &GroupIdSet::new())
        .unwrap();

    let err = engine
        .create_contact(fields("Other Ann", "  ANN@example.com "), &GroupIdSet::new())
        .unwrap_err();
    match err {
        EngineError::Conflict { field, existing, .. } => {
            assert_eq!(field, UniqueField::Email);
            assert_eq!(existing, first);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(engine.list_contacts(None).unwrap().len(), 1);
}

#[test]
fn test_duplicate_phone_on_update_is_conflict() {
    let (_temp, engine) = open_engine();
    let ann = engine
        .create_contact(
            ContactFields {
                phone: Some("+1 555 0100".to_string()),
                ..Default::default()
            },
            &GroupIdSet::new(),
        )
        .unwrap();
    let bob = new_contact(&engine, "Bob");

    let err = engine
        .update_contact(
            bob,
            ContactFields {
                phone: Some("+1 555 0100".to_string()),
                ..Default::default()
            },
            &GroupIdSet::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        engine.directory().find_by_unique_field(UniqueField::Phone, "+1 555 0100").unwrap(),
        Some(ann)
    );
}

#[test]
fn test_contact_may_keep_its_own_email() {
    let (_temp, engine) = open_engine();
    let ann = new_contact(&engine, "Ann");

    let saved = engine
        .update_contact(
            ann,
            ContactFields {
                email: Some("ann@example.com".to_string()),
                first_name: Some("Annie".to_string()),
                ..Default::default()
            },
            &GroupIdSet::new(),
        )
        .unwrap();
    assert_eq!(saved.contact.first_name.as_deref(), Some("Annie"));
}

#[test]
fn test_released_email_can_be_reused() {
    let (_temp, engine) = open_engine();
    let ann = new_contact(&engine, "Ann");
    engine
        .update_contact(
            ann,
            ContactFields {
                email: Some(String::new()),
                ..Default::default()
            },
            &GroupIdSet::new(),
        )
        .unwrap();

    let other = engine
        .create_contact(fields("New Ann", "ann@example.com"), &GroupIdSet::new())
        .unwrap();
    assert_ne!(other, ann);
    assert_eq!(engine.get_contact(ann).unwrap().unwrap().email, None);
    assert_consistent(&engine);
}

#[test]
fn test_list_contacts_with_group_filter() {
    let (_temp, engine) = open_engine();
    let group = new_group(&engine, "Club");
    let ann = new_contact(&engine, "Ann");
    let _bob = new_contact(&engine, "Bob");
    engine.add_contacts_to_group(group, &contact_set([ann])).unwrap();

    let members = engine.list_contacts(Some(group)).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, ann);
    assert_eq!(engine.list_contacts(None).unwrap().len(), 2);
    assert!(engine.list_contacts(Some(GroupId(777))).unwrap().is_empty());
}

#[test]
fn test_create_group_with_initial_members_and_rename() {
    let (_temp, engine) = open_engine();
    let ann = new_contact(&engine, "Ann");

    let saved = engine.create_group("  Neighbours ", &contact_set([ann])).unwrap();
    assert_eq!(saved.group.group_name, "Neighbours");
    assert_eq!(saved.members.inserted_count, 1);

    let renamed = engine.rename_group(saved.group.id, "Street").unwrap();
    assert_eq!(renamed.group_name, "Street");
    assert_eq!(engine.get_group(saved.group.id).unwrap().unwrap().group_name, "Street");

    let err = engine.rename_group(GroupId(9999), "Nowhere").unwrap_err();
    assert!(matches!(err, EngineError::GroupNotFound(_)));
}

#[test]
fn test_invalid_email_is_rejected_before_storage() {
    let (_temp, engine) = open_engine();
    let err = engine
        .create_contact(fields("Ann", "not-an-email"), &GroupIdSet::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.list_contacts(None).unwrap().is_empty());
}

#[test]
fn test_data_survives_reopen() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("store");
    let (ann, group) = {
        let engine = roster::Engine::open(&path).unwrap();
        let group = new_group(&engine, "Persistent");
        let ann = engine
            .create_contact(fields("Ann", "ann@example.com"), &group_set([group]))
            .unwrap();
        engine.flush().unwrap();
        (ann, group)
    };

    let engine = roster::Engine::open(&path).unwrap();
    assert_eq!(engine.groups_of_contact(ann).unwrap(), group_set([group]));
    let next = new_contact(&engine, "Bob");
    assert!(next > ann, "ids keep increasing across reopen");
}
