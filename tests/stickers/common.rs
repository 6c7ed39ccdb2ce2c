//! Shared helpers for the sticker integration tests.

#![allow(dead_code)]

pub use starling::prelude::*;
pub use starling::{DurabilityMode, RetryPolicy, StoreInfo};
pub use std::sync::{Arc, Barrier};
pub use std::thread;
pub use tempfile::TempDir;

use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A user id no other test uses
pub fn unique_user() -> UserId {
    UserId::from(format!("user-{}", COUNTER.fetch_add(1, Ordering::Relaxed)))
}

/// A store id no other test uses
pub fn unique_store() -> StoreId {
    StoreId::from(format!("store-{}", COUNTER.fetch_add(1, Ordering::Relaxed)))
}

/// In-memory database
pub fn ephemeral() -> Starling {
    Starling::ephemeral().expect("ephemeral database")
}

/// Strict-durability database in a fresh temp directory
pub fn persistent() -> (TempDir, Starling) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = open_strict(&dir);
    (dir, db)
}

/// Reopen `dir` with strict durability
pub fn open_strict(dir: &TempDir) -> Starling {
    Starling::builder()
        .path(dir.path())
        .strict()
        .open()
        .expect("open database")
}

/// Record `n` purchases and return the receipts
pub fn purchase_n(db: &Starling, user: &UserId, store: &StoreId, n: usize) -> Vec<PurchaseReceipt> {
    (0..n)
        .map(|_| {
            db.stickers
                .record_purchase(user.clone(), store.clone())
                .expect("purchase")
        })
        .collect()
}

/// Run `n` purchases on one pair from `n` threads released together
pub fn concurrent_purchases(
    db: &Arc<Starling>,
    user: &UserId,
    store: &StoreId,
    n: usize,
) -> Vec<PurchaseReceipt> {
    let barrier = Arc::new(Barrier::new(n));
    let handles: Vec<_> = (0..n)
        .map(|_| {
            let db = Arc::clone(db);
            let barrier = Arc::clone(&barrier);
            let (user, store) = (user.clone(), store.clone());
            thread::spawn(move || {
                barrier.wait();
                db.stickers.record_purchase(user, store)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked").expect("purchase"))
        .collect()
}
