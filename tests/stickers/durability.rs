//! Durability Tests
//!
//! Reopen replay, torn tails and damaged frames.

use crate::common::*;
use std::fs::OpenOptions;
use std::io::Write;

const WAL_FILE: &str = "starling.wal";

#[test]
fn reopen_restores_progress_and_directory() {
    let (dir, db) = persistent();
    let user = unique_user();
    db.registry.put_store("cafe", "Corner Cafe", "Main St").unwrap();
    let alice = db.registry.register_user("alice").unwrap();
    purchase_n(&db, &user, &StoreId::from("cafe"), 16);
    db.close().unwrap();
    drop(db);

    let db = open_strict(&dir);
    let record = db.stickers.get_progress(user.clone(), "cafe").unwrap();
    assert_eq!(record.star_count, 16);
    assert_eq!(record.level, Level::Gold);
    assert_eq!(db.registry.user(alice.user_id.clone()).unwrap(), alice);
    assert_eq!(db.registry.store("cafe").unwrap().name, "Corner Cafe");

    // 2 directory entries, 1 create, 16 purchases
    assert_eq!(db.recovery_report().wal.entries_replayed, 19);
    assert_eq!(db.recovery_report().levels_reconciled, 0);
}

#[test]
fn purchases_continue_after_reopen() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 4);
    drop(db);

    let db = open_strict(&dir);
    let receipt = db.stickers.record_purchase(user, store).unwrap();
    assert_eq!(receipt.star_count, 5);
    assert_eq!(receipt.level, Level::Silver);
    assert!(receipt.leveled_up);
    assert_eq!(receipt.version, 6);
}

#[test]
fn torn_tail_is_ignored() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 3);
    drop(db);

    let wal = dir.path().join(WAL_FILE);
    let intact_len = std::fs::metadata(&wal).unwrap().len();
    {
        let mut file = OpenOptions::new().append(true).open(&wal).unwrap();
        file.write_all(&[0x40, 0x00, 0x00, 0x00, 0xde, 0xad]).unwrap();
    }

    let db = open_strict(&dir);
    assert_eq!(db.stickers.get_progress(user.clone(), store.clone()).unwrap().star_count, 3);
    let report = db.recovery_report();
    assert_eq!(report.wal.torn_tail_bytes, 6);
    assert_eq!(std::fs::metadata(&wal).unwrap().len(), intact_len);

    // new appends land after the last complete frame
    db.stickers.record_purchase(user.clone(), store.clone()).unwrap();
    drop(db);
    let db = open_strict(&dir);
    assert_eq!(db.stickers.get_progress(user, store).unwrap().star_count, 4);
}

#[test]
fn damaged_frame_refuses_to_open() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 3);
    drop(db);

    let wal = dir.path().join(WAL_FILE);
    let mut bytes = std::fs::read(&wal).unwrap();
    // first payload byte after the 8-byte frame header
    bytes[8] ^= 0xff;
    std::fs::write(&wal, &bytes).unwrap();

    let err = Starling::builder().path(dir.path()).open().unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(err.is_serious());
}

#[test]
fn damaged_length_field_never_truncates_the_log() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 6);
    drop(db);

    let wal = dir.path().join(WAL_FILE);
    let mut bytes = std::fs::read(&wal).unwrap();
    // high byte of the first frame's length
    bytes[3] ^= 0x7F;
    std::fs::write(&wal, &bytes).unwrap();

    let err = Starling::builder().path(dir.path()).open().unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(std::fs::read(&wal).unwrap(), bytes);

    let config = StarlingConfig::from_toml_str("[storage]\nmax_corrupt_entries = 1\n").unwrap();
    let db = Starling::builder().path(dir.path()).config(config).open().unwrap();
    assert_eq!(db.recovery_report().wal.corrupt_entries_skipped, 1);
    assert_eq!(db.recovery_report().wal.torn_tail_bytes, 0);
    assert_eq!(db.stickers.get_progress(user, store).unwrap().star_count, 6);
}

#[test]
fn damaged_frame_skipped_within_budget() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 3);
    drop(db);

    let wal = dir.path().join(WAL_FILE);
    let mut bytes = std::fs::read(&wal).unwrap();
    bytes[8] ^= 0xff;
    std::fs::write(&wal, &bytes).unwrap();

    let config = StarlingConfig::from_toml_str(
        r#"
        [storage]
        durability = "strict"
        max_corrupt_entries = 1
        "#,
    )
    .unwrap();
    let db = Starling::builder().path(dir.path()).config(config).open().unwrap();
    let report = db.recovery_report();
    assert_eq!(report.wal.corrupt_entries_skipped, 1);
    // the create frame is lost; later full records still carry the count
    assert_eq!(db.stickers.get_progress(user, store).unwrap().star_count, 3);
}

#[test]
fn reopen_with_new_thresholds_reconciles_levels() {
    let (dir, db) = persistent();
    let (user, store) = (unique_user(), unique_store());
    purchase_n(&db, &user, &store, 6);
    drop(db);

    let table = ThresholdTable::new(vec![
        LevelThreshold::advancing(Level::Bronze, 3, Level::Silver),
        LevelThreshold::advancing(Level::Silver, 6, Level::Gold),
        LevelThreshold::terminal(Level::Gold),
    ])
    .unwrap();
    let db = Starling::builder()
        .path(dir.path())
        .thresholds(table)
        .open()
        .unwrap();
    assert_eq!(db.recovery_report().levels_reconciled, 1);
    assert_eq!(db.stickers.get_progress(user, store).unwrap().level, Level::Gold);
}

#[test]
fn no_durability_keeps_nothing_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (user, store) = (unique_user(), unique_store());
    {
        let db = Starling::builder().path(dir.path()).no_durability().open().unwrap();
        purchase_n(&db, &user, &store, 2);
    }
    assert!(!dir.path().join(WAL_FILE).exists());

    let db = Starling::builder().path(dir.path()).no_durability().open().unwrap();
    assert!(db.stickers.get_progress(user, store).unwrap_err().is_not_found());
}

#[test]
fn buffered_mode_persists_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let (user, store) = (unique_user(), unique_store());
    {
        let db = Starling::builder().path(dir.path()).buffered().open().unwrap();
        purchase_n(&db, &user, &store, 5);
        db.close().unwrap();
    }

    let db = open_strict(&dir);
    assert_eq!(db.stickers.get_progress(user, store).unwrap().level, Level::Silver);
}
