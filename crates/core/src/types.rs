//! Identifier and directory types
//!
//! - [`UserId`] / [`StoreId`]: opaque identifiers for the two sides of a sticker
//! - [`UserInfo`] / [`StoreInfo`]: directory entries owned by registration

use crate::record::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a fresh random identifier (UUID v4)
            pub fn new() -> Self {
                $name(Uuid::new_v4().to_string())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Opaque identifier of a user
    ///
    /// Identifiers are compared and ordered as plain strings; the core never
    /// interprets them.
    UserId
);

string_id!(
    /// Opaque identifier of a store
    ///
    /// Listings are ordered by this identifier.
    StoreId
);

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier
    pub user_id: UserId,
    /// Unique username
    pub username: String,
    /// Registration time
    pub created_at: Timestamp,
}

/// A registered store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Store identifier
    pub store_id: StoreId,
    /// Display name
    pub name: String,
    /// Free-form location
    pub location: String,
}

impl StoreInfo {
    /// Create a store entry
    pub fn new(store_id: StoreId, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            store_id,
            name: name.into(),
            location: location.into(),
        }
    }
}
