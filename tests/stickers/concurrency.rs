//! Concurrency Tests
//!
//! Concurrent purchases on one pair are never lost and level up exactly once
//! per threshold crossed.

use crate::common::*;
use std::collections::HashSet;

fn check_concurrent(n: usize) {
    let db = Arc::new(ephemeral());
    let (user, store) = (unique_user(), unique_store());

    let receipts = concurrent_purchases(&db, &user, &store, n);

    let record = db.stickers.get_progress(user, store).unwrap();
    assert_eq!(record.star_count, n as u64);
    assert_eq!(record.level, db.thresholds().level_for(n as u64));

    // every purchase observed a distinct count
    let counts: HashSet<u64> = receipts.iter().map(|r| r.star_count).collect();
    assert_eq!(counts.len(), n);

    let crossed = [5u64, 15, 30].iter().filter(|&&t| t <= n as u64).count();
    let level_ups: Vec<_> = receipts.iter().filter(|r| r.leveled_up).collect();
    assert_eq!(level_ups.len(), crossed);
    for receipt in level_ups {
        assert!([5, 15, 30].contains(&receipt.star_count));
    }
}

#[test]
fn single_purchase() {
    check_concurrent(1);
}

#[test]
fn ten_concurrent_purchases() {
    check_concurrent(10);
}

#[test]
fn hundred_concurrent_purchases() {
    check_concurrent(100);
}

#[test]
fn concurrent_first_purchases_create_one_record() {
    let db = Arc::new(ephemeral());
    let (user, store) = (unique_user(), unique_store());

    concurrent_purchases(&db, &user, &store, 8);
    assert_eq!(db.stickers.list_progress(user).unwrap().len(), 1);
    assert_eq!(db.metrics().records, 1);
}

#[test]
fn distinct_pairs_do_not_interfere() {
    let db = Arc::new(ephemeral());
    let users: Vec<UserId> = (0..8).map(|_| unique_user()).collect();
    let store = unique_store();
    let barrier = Arc::new(Barrier::new(users.len()));

    let handles: Vec<_> = users
        .iter()
        .cloned()
        .map(|user| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            let store = store.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    db.stickers.record_purchase(user.clone(), store.clone()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for user in users {
        let record = db.stickers.get_progress(user, store.clone()).unwrap();
        assert_eq!(record.star_count, 20);
        assert_eq!(record.level, Level::Gold);
    }
    assert_eq!(db.metrics().purchases_recorded, 160);
}

#[test]
fn concurrent_purchases_survive_reopen() {
    let (dir, db) = persistent();
    let db = Arc::new(db);
    let (user, store) = (unique_user(), unique_store());

    concurrent_purchases(&db, &user, &store, 32);
    drop(db);

    let db = open_strict(&dir);
    let record = db.stickers.get_progress(user, store).unwrap();
    assert_eq!(record.star_count, 32);
    assert_eq!(record.level, Level::Platinum);
}
