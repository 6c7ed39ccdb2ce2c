//! Configuration Tests
//!
//! Custom levels from TOML, rejected tables, request deadlines.

use crate::common::*;
use std::time::Duration;

#[test]
fn custom_levels_from_toml() {
    let config = StarlingConfig::from_toml_str(
        r#"
        [[levels]]
        level = "bronze"
        stars_required = 2
        next_level = "silver"

        [[levels]]
        level = "silver"
        "#,
    )
    .unwrap();
    let db = Starling::builder().config(config).open().unwrap();
    let (user, store) = (unique_user(), unique_store());

    let receipts = purchase_n(&db, &user, &store, 3);
    assert!(receipts[1].leveled_up);
    assert_eq!(receipts[2].level, Level::Silver);
    assert!(!receipts[2].leveled_up);
    assert_eq!(db.thresholds().len(), 2);
}

#[test]
fn empty_config_is_the_standard_setup() {
    let config = StarlingConfig::from_toml_str("").unwrap();
    let db = Starling::builder().config(config).open().unwrap();
    assert_eq!(db.thresholds(), &ThresholdTable::standard());
}

#[test]
fn invalid_table_refuses_to_open() {
    let mut config = StarlingConfig::default();
    config.levels = Some(vec![
        LevelThreshold::advancing(Level::Bronze, 15, Level::Silver),
        LevelThreshold::advancing(Level::Silver, 5, Level::Gold),
        LevelThreshold::terminal(Level::Gold),
    ]);
    let err = Starling::builder().config(config).open().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn invalid_table_rejected_while_parsing() {
    assert!(StarlingConfig::from_toml_str(
        r#"
        [[levels]]
        level = "silver"
        "#,
    )
    .is_err());
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(StarlingConfig::from_toml_str("[storage]\ncompression = true\n").is_err());
}

#[test]
fn zero_retry_attempts_refuse_to_open() {
    let err = Starling::builder()
        .retry(RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        })
        .open()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn expired_deadline_leaves_record_unchanged() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 2);

    let ctx = OpContext::with_timeout(Duration::ZERO);
    thread::sleep(Duration::from_millis(2));
    let err = db
        .stickers
        .record_purchase_with(user.clone(), store.clone(), &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
    assert!(!err.is_retryable());

    let record = db.stickers.get_progress(user, store).unwrap();
    assert_eq!(record.star_count, 2);
}

#[test]
fn cancelled_first_purchase_creates_nothing() {
    let db = ephemeral();
    let (user, store) = (unique_user(), unique_store());

    let token = CancellationToken::new();
    token.cancel();
    let ctx = OpContext::background().cancelled_by(token);
    assert!(db
        .stickers
        .record_purchase_with(user.clone(), store.clone(), &ctx)
        .is_err());
    assert!(db.stickers.get_progress(user, store).unwrap_err().is_not_found());
}

#[test]
fn no_default_timeout_still_records() {
    let db = Starling::builder().request_timeout(None).open().unwrap();
    let receipt = db
        .stickers
        .record_purchase(unique_user(), unique_store())
        .unwrap();
    assert_eq!(receipt.star_count, 1);
}

#[test]
fn config_file_round_trip_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("starling.toml");
    std::fs::write(
        &path,
        "[storage]\ndurability = \"none\"\n\n[requests]\ntimeout_ms = 0\n",
    )
    .unwrap();

    let config = StarlingConfig::load(&path).unwrap();
    let db = Starling::builder()
        .path(dir.path().join("data"))
        .config(config)
        .open()
        .unwrap();
    assert_eq!(db.durability_mode(), DurabilityMode::None);
}
