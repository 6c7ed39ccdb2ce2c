//! User and store directory.

use crate::error::Result;
use crate::types::{StoreId, StoreInfo, UserId, UserInfo};
use std::sync::Arc;

/// Directory operations.
///
/// Access via `db.registry`. Purchases never require a registration; the
/// directory only supplies names for sticker views.
pub struct Registry {
    db: Arc<starling_engine::Database>,
}

impl Registry {
    pub(crate) fn new(db: Arc<starling_engine::Database>) -> Self {
        Self { db }
    }

    /// Register a user, or return the existing user with that username.
    pub fn register_user(&self, username: &str) -> Result<UserInfo> {
        Ok(self.db.register_user(username)?)
    }

    /// Register a store under a freshly generated id.
    pub fn register_store(&self, name: &str, location: &str) -> Result<StoreInfo> {
        Ok(self.db.register_store(name, location)?)
    }

    /// Insert or replace a store under its own id.
    pub fn put_store(
        &self,
        store: impl Into<StoreId>,
        name: &str,
        location: &str,
    ) -> Result<StoreInfo> {
        let info = StoreInfo::new(store.into(), name, location);
        self.db.put_store(info.clone())?;
        Ok(info)
    }

    /// Look up a user.
    pub fn user(&self, user: impl Into<UserId>) -> Result<UserInfo> {
        Ok(self.db.user(&user.into())?)
    }

    /// Look up a user by username.
    pub fn user_by_name(&self, username: &str) -> Option<UserInfo> {
        self.db.user_by_name(username)
    }

    /// Look up a store.
    pub fn store(&self, store: impl Into<StoreId>) -> Result<StoreInfo> {
        Ok(self.db.store(&store.into())?)
    }

    /// All stores, ordered by id.
    pub fn stores(&self) -> Vec<StoreInfo> {
        self.db.stores()
    }
}
