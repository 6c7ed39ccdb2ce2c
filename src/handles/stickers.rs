//! Purchases and progression queries.
//!
//! # Example
//!
//! ```ignore
//! use starling::prelude::*;
//!
//! let db = Starling::ephemeral()?;
//!
//! for _ in 0..5 {
//!     db.stickers.record_purchase("alice", "corner-cafe")?;
//! }
//! let sticker = db.stickers.sticker("alice", "corner-cafe")?;
//! assert_eq!(sticker.level, Level::Silver);
//! ```

use crate::error::Result;
use crate::types::{
    OpContext, PurchaseReceipt, SatisfactionRecord, StickerView, StoreId, ThresholdTable, UserId,
};
use std::sync::Arc;

/// Sticker operations.
///
/// Access via `db.stickers`.
pub struct Stickers {
    db: Arc<starling_engine::Database>,
}

impl Stickers {
    pub(crate) fn new(db: Arc<starling_engine::Database>) -> Self {
        Self { db }
    }

    /// Record one purchase: one more star, and a level-up when a threshold
    /// is reached.
    ///
    /// Runs under the configured request deadline.
    pub fn record_purchase(
        &self,
        user: impl Into<UserId>,
        store: impl Into<StoreId>,
    ) -> Result<PurchaseReceipt> {
        Ok(self.db.record_purchase(&user.into(), &store.into())?)
    }

    /// Record one purchase under an explicit cancellation/deadline context.
    pub fn record_purchase_with(
        &self,
        user: impl Into<UserId>,
        store: impl Into<StoreId>,
        ctx: &OpContext,
    ) -> Result<PurchaseReceipt> {
        Ok(self
            .db
            .record_purchase_with(&user.into(), &store.into(), ctx)?)
    }

    /// The raw record for a pair; `NotFound` before the first purchase.
    pub fn get_progress(
        &self,
        user: impl Into<UserId>,
        store: impl Into<StoreId>,
    ) -> Result<SatisfactionRecord> {
        Ok(self.db.get_progress(&user.into(), &store.into())?)
    }

    /// All raw records of a user, ordered by store id.
    pub fn list_progress(
        &self,
        user: impl Into<UserId>,
    ) -> Result<Vec<(StoreId, SatisfactionRecord)>> {
        Ok(self.db.list_progress(&user.into())?)
    }

    /// A record joined with its store's name and location.
    pub fn sticker(&self, user: impl Into<UserId>, store: impl Into<StoreId>) -> Result<StickerView> {
        Ok(self.db.sticker(&user.into(), &store.into())?)
    }

    /// Every sticker of a user, ordered by store id.
    pub fn stickers(&self, user: impl Into<UserId>) -> Result<Vec<StickerView>> {
        Ok(self.db.stickers(&user.into())?)
    }

    /// The active threshold table.
    pub fn thresholds(&self) -> &ThresholdTable {
        self.db.thresholds()
    }
}
