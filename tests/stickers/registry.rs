//! Registry Tests
//!
//! Users and stores in the directory.

use crate::common::*;

#[test]
fn register_user_is_idempotent_by_username() {
    let db = ephemeral();
    let first = db.registry.register_user("carol").unwrap();
    let again = db.registry.register_user("  carol ").unwrap();
    assert_eq!(first.user_id, again.user_id);
    assert_eq!(db.registry.user_by_name("carol").unwrap(), first);
    assert_eq!(db.metrics().users, 1);
}

#[test]
fn empty_username_is_invalid() {
    let db = ephemeral();
    let err = db.registry.register_user("   ").unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn unknown_user_and_store_are_not_found() {
    let db = ephemeral();
    assert!(db.registry.user(unique_user()).unwrap_err().is_not_found());
    assert!(db.registry.store(unique_store()).unwrap_err().is_not_found());
    assert!(db.registry.user_by_name("nobody").is_none());
}

#[test]
fn register_store_assigns_fresh_ids() {
    let db = ephemeral();
    let a = db.registry.register_store("Corner Cafe", "Main St").unwrap();
    let b = db.registry.register_store("Corner Cafe", "Main St").unwrap();
    assert_ne!(a.store_id, b.store_id);
    assert_eq!(db.registry.store(a.store_id.clone()).unwrap(), a);
    assert_eq!(db.registry.stores().len(), 2);
}

#[test]
fn put_store_replaces_existing_entry() {
    let db = ephemeral();
    db.registry.put_store("cafe", "Corner Cafe", "Main St").unwrap();
    db.registry.put_store("cafe", "Corner Cafe", "High St").unwrap();

    let stores = db.registry.stores();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].location, "High St");
}

#[test]
fn put_store_requires_a_name() {
    let db = ephemeral();
    let err = db.registry.put_store("cafe", "  ", "Main St").unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn purchases_do_not_require_registration() {
    let db = ephemeral();
    let receipt = db.stickers.record_purchase("walk-in", "pop-up").unwrap();
    assert_eq!(receipt.star_count, 1);
    assert!(db.registry.stores().is_empty());
}

#[test]
fn stores_listed_by_id() {
    let db = ephemeral();
    for id in ["s3", "s1", "s2"] {
        db.registry.put_store(id, id, "here").unwrap();
    }
    let ids: Vec<_> = db
        .registry
        .stores()
        .into_iter()
        .map(|s| s.store_id.to_string())
        .collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
}
