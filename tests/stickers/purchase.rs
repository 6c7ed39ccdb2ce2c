//! Purchase Tests
//!
//! One star per purchase, level-ups at the standard thresholds.

use crate::common::*;

#[test]
fn first_purchase_creates_bronze_sticker_with_one_star() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let receipt = db.stickers.record_purchase(user.clone(), store.clone()).unwrap();
    assert_eq!(receipt.user_id, user);
    assert_eq!(receipt.store_id, store);
    assert_eq!(receipt.star_count, 1);
    assert_eq!(receipt.level, Level::Bronze);
    assert!(!receipt.leveled_up);
}

#[test]
fn fifth_purchase_reaches_silver() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let receipts = purchase_n(&db, &user, &store, 5);
    let level_ups: Vec<_> = receipts.iter().filter(|r| r.leveled_up).collect();
    assert_eq!(level_ups.len(), 1);
    assert_eq!(level_ups[0].star_count, 5);
    assert_eq!(level_ups[0].level, Level::Silver);
}

#[test]
fn fifteenth_purchase_reaches_gold() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let receipts = purchase_n(&db, &user, &store, 15);
    assert_eq!(receipts[13].level, Level::Silver);
    assert!(!receipts[13].leveled_up);
    assert_eq!(receipts[14].level, Level::Gold);
    assert!(receipts[14].leveled_up);
}

#[test]
fn purchase_inside_a_level_does_not_level_up() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let receipts = purchase_n(&db, &user, &store, 6);
    assert_eq!(receipts[5].star_count, 6);
    assert_eq!(receipts[5].level, Level::Silver);
    assert!(!receipts[5].leveled_up);
}

#[test]
fn star_count_and_version_increase_by_one() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let receipts = purchase_n(&db, &user, &store, 40);
    for pair in receipts.windows(2) {
        assert_eq!(pair[1].star_count, pair[0].star_count + 1);
        assert_eq!(pair[1].version, pair[0].version + 1);
    }
    assert_eq!(receipts.last().unwrap().level, Level::Platinum);
    assert_eq!(receipts.iter().filter(|r| r.leveled_up).count(), 3);
}

#[test]
fn stores_progress_independently() {
    let db = ephemeral();
    let user = unique_user();
    let (a, b) = (unique_store(), unique_store());

    purchase_n(&db, &user, &a, 5);
    purchase_n(&db, &user, &b, 1);

    assert_eq!(db.stickers.get_progress(user.clone(), a).unwrap().level, Level::Silver);
    assert_eq!(db.stickers.get_progress(user, b).unwrap().level, Level::Bronze);
}

#[test]
fn custom_thresholds_drive_level_ups() {
    let table = ThresholdTable::new(vec![
        LevelThreshold {
            level: Level::Bronze,
            stars_required: 2,
            next_level: Some(Level::Silver),
        },
        LevelThreshold {
            level: Level::Silver,
            stars_required: 3,
            next_level: Some(Level::Gold),
        },
        LevelThreshold {
            level: Level::Gold,
            stars_required: u32::MAX,
            next_level: None,
        },
    ])
    .unwrap();
    let db = Starling::builder().thresholds(table).open().unwrap();
    let (user, store) = (unique_user(), unique_store());

    let levels: Vec<_> = purchase_n(&db, &user, &store, 4)
        .into_iter()
        .map(|r| r.level)
        .collect();
    assert_eq!(levels, vec![Level::Bronze, Level::Silver, Level::Gold, Level::Gold]);
}

#[test]
fn cancelled_purchase_changes_nothing() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 3);

    let token = CancellationToken::new();
    token.cancel();
    let ctx = OpContext::background().cancelled_by(token);
    let err = db
        .stickers
        .record_purchase_with(user.clone(), store.clone(), &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
    assert_eq!(db.stickers.get_progress(user, store).unwrap().star_count, 3);
    assert_eq!(db.metrics().purchases_failed, 1);
}

#[test]
fn receipt_serializes_with_lowercase_level() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());
    let receipt = db.stickers.record_purchase(user, store).unwrap();

    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json["star_count"], 1);
    assert_eq!(json["level"], "bronze");
    assert_eq!(json["leveled_up"], false);
}

mod props {
    use crate::common::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sequential_purchases_match_threshold_table(n in 1usize..64) {
            let db = ephemeral();
            let (user, store) = (unique_user(), unique_store());
            let receipts = purchase_n(&db, &user, &store, n);

            let table = db.thresholds();
            for (i, receipt) in receipts.iter().enumerate() {
                let stars = (i + 1) as u64;
                prop_assert_eq!(receipt.star_count, stars);
                prop_assert_eq!(receipt.level, table.level_for(stars));
                let previous = table.level_for(stars - 1);
                prop_assert_eq!(receipt.leveled_up, previous != receipt.level);
            }
        }
    }
}
