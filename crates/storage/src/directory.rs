//! Registered users and stores
//!
//! Registration is plain inserts; the only rule is that usernames are unique,
//! and registering an existing username returns the existing user.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use starling_core::{StoreId, StoreInfo, UserId, UserInfo};

/// In-memory user and store directory
#[derive(Debug, Default)]
pub struct Directory {
    users: DashMap<UserId, UserInfo>,
    usernames: DashMap<String, UserId>,
    stores: DashMap<StoreId, StoreInfo>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user registered under `username`, or register the one
    /// `make` produces
    ///
    /// `make` runs while the username is locked, so concurrent registrations
    /// of one name produce a single user. The flag is true when this call
    /// registered the user.
    pub fn register_user_with<E>(
        &self,
        username: &str,
        make: impl FnOnce() -> Result<UserInfo, E>,
    ) -> Result<(UserInfo, bool), E> {
        match self.usernames.entry(username.to_string()) {
            Entry::Occupied(existing) => {
                let user_id = existing.get();
                if let Some(info) = self.users.get(user_id) {
                    return Ok((info.clone(), false));
                }
                // Index points at a user that was never installed; replace it.
                let info = make()?;
                self.users.insert(info.user_id.clone(), info.clone());
                *existing.into_ref() = info.user_id.clone();
                Ok((info, true))
            }
            Entry::Vacant(slot) => {
                let info = make()?;
                self.users.insert(info.user_id.clone(), info.clone());
                slot.insert(info.user_id.clone());
                Ok((info, true))
            }
        }
    }

    /// Install a user unconditionally (WAL replay)
    pub fn put_user(&self, info: UserInfo) {
        self.usernames.insert(info.username.clone(), info.user_id.clone());
        self.users.insert(info.user_id.clone(), info);
    }

    /// Insert or replace a store after `log` accepts it
    ///
    /// `log` runs while the store id is locked; if it fails the directory is
    /// unchanged.
    pub fn put_store_with<E>(
        &self,
        info: StoreInfo,
        log: impl FnOnce(&StoreInfo) -> Result<(), E>,
    ) -> Result<(), E> {
        match self.stores.entry(info.store_id.clone()) {
            Entry::Occupied(mut existing) => {
                log(&info)?;
                existing.insert(info);
            }
            Entry::Vacant(slot) => {
                log(&info)?;
                slot.insert(info);
            }
        }
        Ok(())
    }

    /// Install a store unconditionally (WAL replay)
    pub fn put_store(&self, info: StoreInfo) {
        self.stores.insert(info.store_id.clone(), info);
    }

    /// Look up a user
    pub fn user(&self, user_id: &UserId) -> Option<UserInfo> {
        self.users.get(user_id).map(|u| u.clone())
    }

    /// Look up a user by username
    pub fn user_by_name(&self, username: &str) -> Option<UserInfo> {
        self.usernames
            .get(username)
            .and_then(|id| self.users.get(id.value()).map(|u| u.clone()))
    }

    /// Look up a store
    pub fn store(&self, store_id: &StoreId) -> Option<StoreInfo> {
        self.stores.get(store_id).map(|s| s.clone())
    }

    /// All stores, sorted by id
    pub fn stores(&self) -> Vec<StoreInfo> {
        let mut stores: Vec<_> = self.stores.iter().map(|s| s.value().clone()).collect();
        stores.sort_by(|a, b| a.store_id.cmp(&b.store_id));
        stores
    }

    /// Number of registered users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of registered stores
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}
