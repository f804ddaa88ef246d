//! Shared test utilities for integration tests
//!
//! Every test opens its own engine over a temp directory; nothing is shared.

use roster::store::ContactFields;
use roster::types::{ContactId, ContactIdSet, GroupId, GroupIdSet};
use roster::Engine;
use tempfile::TempDir;

/// Open an isolated engine. Keep the `TempDir` alive for the test's duration.
pub fn open_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(temp_dir.path().join("store")).unwrap();
    (temp_dir, engine)
}

pub fn fields(first_name: &str, email: &str) -> ContactFields {
    ContactFields {
        first_name: Some(first_name.to_string()),
        email: Some(email.to_string()),
        ..Default::default()
    }
}

pub fn new_contact(engine: &Engine, first_name: &str) -> ContactId {
    let email = format!("{}@example.com", first_name.to_lowercase());
    engine
        .create_contact(fields(first_name, &email), &GroupIdSet::new())
        .unwrap()
}

pub fn new_group(engine: &Engine, name: &str) -> GroupId {
    engine.create_group(name, &ContactIdSet::new()).unwrap().group.id
}

pub fn contact_set<const N: usize>(ids: [ContactId; N]) -> ContactIdSet {
    ids.into_iter().collect()
}

pub fn group_set<const N: usize>(ids: [GroupId; N]) -> GroupIdSet {
    ids.into_iter().collect()
}

/// Assert the membership mirrors and unique indexes agree.
pub fn assert_consistent(engine: &Engine) {
    let report = engine.check_integrity().unwrap();
    assert!(report.is_consistent(), "integrity issues: {:?}", report.issues);
}
