use chrono::{DateTime, Utc};
use homeroom_store::Store;
use homeroom_types::{User, UserId};

/// Look a user up regardless of account state
pub fn user_by_username(store: &Store, username: &str) -> Option<User> {
    store.users().find(|u| u.username == username).cloned()
}

pub fn username_exists(store: &Store, username: &str) -> bool {
    store.users().any(|u| u.username == username)
}

/// Only non-deactivated accounts are visible to service operations
pub fn active_user(store: &Store, id: UserId) -> Option<User> {
    store.get_user(id).filter(User::is_active)
}

/// Accounts whose deactivation predates the purge cutoff
pub fn purgeable_users(store: &Store, cutoff: DateTime<Utc>) -> Vec<User> {
    store
        .users()
        .filter(|u| matches!(u.state.deactivated_at(), Some(at) if at < cutoff))
        .cloned()
        .collect()
}
