//! Concurrent commands against one shared engine

use super::test_utils::{assert_consistent, contact_set, fields, new_contact, new_group};
use roster::transaction::TransactionConfig;
use roster::types::{ContactId, ContactIdSet, GroupIdSet};
use roster::Engine;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn open_shared_engine(temp_dir: &TempDir) -> Arc<Engine> {
    let db = sled::open(temp_dir.path().join("store")).unwrap();
    // Generous retry budget: every thread writes the same group key.
    let engine = Engine::from_db(db, TransactionConfig { max_attempts: 10_000 }).unwrap();
    Arc::new(engine)
}

#[test]
fn test_overlapping_bulk_adds_insert_each_pair_once() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_shared_engine(&temp_dir);
    let group = new_group(&engine, "Crowd");
    let contacts: Vec<ContactId> = (0..20)
        .map(|i| new_contact(&engine, &format!("Person{}", i)))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let batch: ContactIdSet = contacts.iter().skip(t * 2).take(10).copied().collect();
            thread::spawn(move || engine.add_contacts_to_group(group, &batch).unwrap())
        })
        .collect();

    let mut inserted = ContactIdSet::new();
    let mut total = 0;
    for handle in handles {
        let added = handle.join().unwrap();
        total += added.inserted_count;
        for id in added.inserted_ids {
            assert!(inserted.insert(id), "contact {} inserted twice", id);
        }
    }

    let expected: ContactIdSet = contacts.iter().take(24).copied().collect();
    assert_eq!(inserted, expected);
    assert_eq!(total, expected.len());
    assert_eq!(engine.members_of_group(group).unwrap(), expected);
    assert_eq!(engine.directory().membership_count().unwrap(), expected.len());
    assert_consistent(&engine);
}

#[test]
fn test_racing_creates_with_same_email_yield_one_contact() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_shared_engine(&temp_dir);

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.create_contact(fields(&format!("Twin{}", t), "twin@example.com"), &GroupIdSet::new())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.kind(), roster::ErrorKind::Conflict);
    }
    assert_eq!(engine.list_contacts(None).unwrap().len(), 1);
    assert_consistent(&engine);
}

#[test]
fn test_delete_racing_with_add_leaves_consistent_state() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_shared_engine(&temp_dir);
    let group = new_group(&engine, "Volatile");
    let contacts: Vec<ContactId> = (0..10)
        .map(|i| new_contact(&engine, &format!("Member{}", i)))
        .collect();
    let all: ContactIdSet = contacts.iter().copied().collect();

    let adder = {
        let engine = Arc::clone(&engine);
        let all = all.clone();
        thread::spawn(move || {
            // Fails with not-found once the deleter wins; either outcome is fine.
            let _ = engine.add_contacts_to_group(group, &all);
        })
    };
    let deleter = {
        let engine = Arc::clone(&engine);
        let doomed = contact_set([contacts[0], contacts[1]]);
        thread::spawn(move || engine.delete_contacts(&doomed).unwrap())
    };
    adder.join().unwrap();
    assert_eq!(deleter.join().unwrap(), 2);

    let members = engine.members_of_group(group).unwrap();
    assert!(!members.contains(&contacts[0]));
    assert!(!members.contains(&contacts[1]));
    assert_consistent(&engine);
}
