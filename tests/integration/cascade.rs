//! Cascading deletes remove every membership row with the entity

use super::test_utils::{
    assert_consistent, contact_set, fields, group_set, new_contact, new_group, open_engine,
};
use roster::error::UniqueField;
use roster::types::{ContactId, GroupId};

#[test]
fn test_delete_contact_removes_all_memberships() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let g2 = new_group(&engine, "G2");
    let contact = engine
        .create_contact(fields("Ann", "ann@example.com"), &group_set([g1, g2]))
        .unwrap();
    let other = new_contact(&engine, "Bob");
    engine.add_contacts_to_group(g1, &contact_set([other])).unwrap();

    let removed = engine.delete_contacts(&contact_set([contact])).unwrap();
    assert_eq!(removed, 1);
    assert!(engine.get_contact(contact).unwrap().is_none());
    assert!(engine.groups_of_contact(contact).unwrap().is_empty());
    assert_eq!(engine.members_of_group(g1).unwrap(), contact_set([other]));
    assert!(engine.members_of_group(g2).unwrap().is_empty());
    assert_eq!(
        engine
            .directory()
            .find_by_unique_field(UniqueField::Email, "ann@example.com")
            .unwrap(),
        None
    );
    assert_consistent(&engine);
}

#[test]
fn test_delete_groups_keeps_contacts() {
    let (_temp, engine) = open_engine();
    let g1 = new_group(&engine, "G1");
    let g2 = new_group(&engine, "G2");
    let ann = engine
        .create_contact(fields("Ann", "ann@example.com"), &group_set([g1, g2]))
        .unwrap();

    let removed = engine.delete_groups(&group_set([g1, GroupId(5555)])).unwrap();
    assert_eq!(removed, 1);
    assert!(engine.get_group(g1).unwrap().is_none());
    assert!(engine.get_contact(ann).unwrap().is_some());
    assert_eq!(engine.groups_of_contact(ann).unwrap(), group_set([g2]));
    assert_consistent(&engine);
}

#[test]
fn test_delete_counts_only_existing_entities() {
    let (_temp, engine) = open_engine();
    let ann = new_contact(&engine, "Ann");

    assert_eq!(engine.delete_contacts(&contact_set([ann, ContactId(8080)])).unwrap(), 1);
    assert_eq!(engine.delete_contacts(&contact_set([ann])).unwrap(), 0);
    assert_eq!(engine.delete_contacts(&Default::default()).unwrap(), 0);
    assert_eq!(engine.delete_groups(&Default::default()).unwrap(), 0);
}
