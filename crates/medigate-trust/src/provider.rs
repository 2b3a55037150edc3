//! The attribute provider seam.
//!
//! [`AttributeProvider`] abstracts the identity directory the engine pulls
//! user attributes from. Production wires a real directory behind it; tests
//! and demos use [`StaticDirectory`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use medigate_types::{UserId, UserSnapshot};

/// Error type for attribute fetches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The directory has no record of this user.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The directory could not be reached or answered abnormally.
    #[error("attribute provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for attribute fetches.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Source of current user attributes.
///
/// Implementations must return a complete snapshot per call; the engine
/// replaces cached snapshots wholesale and never patches individual fields.
pub trait AttributeProvider: Send + Sync {
    /// Fetches the current attribute snapshot for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UserNotFound`] for unknown users, or
    /// [`ProviderError::Unavailable`] when the directory cannot answer.
    fn fetch_user(&self, id: &UserId) -> Result<UserSnapshot>;
}

/// In-memory attribute directory.
///
/// Backs tests and demos; `upsert` replaces a user's snapshot wholesale.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: RwLock<HashMap<UserId, UserSnapshot>>,
}

impl StaticDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-seeded with the given users.
    pub fn with_users(users: impl IntoIterator<Item = UserSnapshot>) -> Self {
        Self {
            users: RwLock::new(
                users
                    .into_iter()
                    .map(|user| (user.id.clone(), user))
                    .collect(),
            ),
        }
    }

    /// Inserts or replaces a user's snapshot.
    pub fn upsert(&self, user: UserSnapshot) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id.clone(), user);
    }

    /// Removes a user, returning the last snapshot when one existed.
    pub fn remove(&self, id: &UserId) -> Option<UserSnapshot> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

impl AttributeProvider for StaticDirectory {
    fn fetch_user(&self, id: &UserId) -> Result<UserSnapshot> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::UserNotFound(id.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use medigate_types::Role;

    #[test]
    fn unknown_user_is_not_found() {
        let directory = StaticDirectory::new();
        let id = UserId::from("ghost");
        assert_eq!(
            directory.fetch_user(&id),
            Err(ProviderError::UserNotFound(id))
        );
    }

    #[test]
    fn upsert_replaces_snapshot_wholesale() {
        let directory = StaticDirectory::new();
        let id = UserId::from("u-1");

        directory.upsert(
            UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor)
                .with_shift(true)
                .with_device("device123"),
        );
        directory.upsert(UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor));

        let fetched = directory.fetch_user(&id).expect("user exists");
        // The second snapshot carried no device; the first one's does not leak.
        assert!(!fetched.active_shift);
        assert_eq!(fetched.last_device_id, "");
    }

    #[test]
    fn remove_then_fetch_is_not_found() {
        let user = UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor);
        let directory = StaticDirectory::with_users([user.clone()]);

        assert_eq!(directory.remove(&user.id), Some(user.clone()));
        assert_eq!(
            directory.fetch_user(&user.id),
            Err(ProviderError::UserNotFound(user.id))
        );
    }
}
