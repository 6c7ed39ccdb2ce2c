//! Query Tests
//!
//! `get_progress`, `list_progress` and the joined sticker views.

use crate::common::*;

#[test]
fn progress_before_any_purchase_is_not_found() {
    let db = ephemeral();
    let err = db
        .stickers
        .get_progress(unique_user(), unique_store())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn reading_progress_never_creates_a_record() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());
    let _ = db.stickers.get_progress(user.clone(), store.clone());
    let _ = db.stickers.sticker(user.clone(), store);
    assert!(db.stickers.list_progress(user).unwrap().is_empty());
    assert_eq!(db.metrics().records, 0);
}

#[test]
fn progress_after_one_purchase() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());
    db.stickers.record_purchase(user.clone(), store.clone()).unwrap();

    let record = db.stickers.get_progress(user, store).unwrap();
    assert_eq!(record.star_count, 1);
    assert_eq!(record.level, Level::Bronze);
}

#[test]
fn list_is_ordered_by_store_id() {
    let db = ephemeral();
    let user = unique_user();
    db.stickers.record_purchase(user.clone(), "s2").unwrap();
    db.stickers.record_purchase(user.clone(), "s1").unwrap();
    db.stickers.record_purchase(user.clone(), "s2").unwrap();

    let list = db.stickers.list_progress(user).unwrap();
    let ids: Vec<_> = list.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);
    assert_eq!(list[1].1.star_count, 2);
}

#[test]
fn list_for_unknown_user_is_empty() {
    let db = ephemeral();
    assert!(db.stickers.list_progress(unique_user()).unwrap().is_empty());
    assert!(db.stickers.stickers(unique_user()).unwrap().is_empty());
}

#[test]
fn sticker_view_joins_store_directory() {
    let db = ephemeral();
    let user = unique_user();
    db.registry.put_store("cafe", "Corner Cafe", "Main St").unwrap();

    purchase_n(&db, &user, &StoreId::from("cafe"), 5);
    db.stickers.record_purchase(user.clone(), "kiosk").unwrap();

    let known = db.stickers.sticker(user.clone(), "cafe").unwrap();
    assert_eq!(known.store_name.as_deref(), Some("Corner Cafe"));
    assert_eq!(known.location.as_deref(), Some("Main St"));
    assert_eq!(known.star_count, 5);
    assert_eq!(known.level, Level::Silver);

    let all = db.stickers.stickers(user).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].store_id, StoreId::from("cafe"));
    assert_eq!(all[1].store_id, StoreId::from("kiosk"));
    assert!(all[1].store_name.is_none());
}

#[test]
fn thresholds_are_exposed() {
    let db = ephemeral();
    let table = db.stickers.thresholds();
    assert_eq!(table, &ThresholdTable::standard());
    assert_eq!(table.level_for(4), Level::Bronze);
    assert_eq!(table.level_for(5), Level::Silver);
    assert_eq!(table.level_for(15), Level::Gold);
}
