use homeroom_store::Store;
use homeroom_types::{Channel, ChannelId, ChannelState, UserId};

/// A teacher's live (non-pending-deleted) channel, if any
pub fn live_channel_by_owner(store: &Store, owner: UserId) -> Option<Channel> {
    store
        .channels()
        .find(|c| c.owner == owner && c.is_live())
        .cloned()
}

/// Ownership-scoped lookup; pending-deleted channels are invisible
pub fn live_channel_by_id_and_owner(
    store: &Store,
    channel_id: ChannelId,
    owner: UserId,
) -> Option<Channel> {
    store
        .get_channel(channel_id)
        .filter(|c| c.owner == owner && c.is_live())
}

/// Ownership-scoped lookup spanning every state; used where an
/// already-pending channel must stay visible (idempotent pending-delete)
pub fn channel_by_id_and_owner(
    store: &Store,
    channel_id: ChannelId,
    owner: UserId,
) -> Option<Channel> {
    store
        .get_channel(channel_id)
        .filter(|c| c.owner == owner)
}

/// Join-code lookup; pending-deleted channels are invisible to join
pub fn live_channel_by_entry_code(store: &Store, entry_code: &str) -> Option<Channel> {
    store
        .channels()
        .find(|c| c.entry_code == entry_code && c.is_live())
        .cloned()
}

/// The most recently pending-deleted channel of a teacher, for restore
pub fn latest_pending_channel_by_owner(store: &Store, owner: UserId) -> Option<Channel> {
    store
        .channels()
        .filter(|c| c.owner == owner)
        .filter_map(|c| match c.state {
            ChannelState::PendingDeleted { since, .. } => Some((since, c)),
            ChannelState::Active => None,
        })
        .max_by_key(|(since, _)| *since)
        .map(|(_, c)| c.clone())
}

/// Collision check spans every channel regardless of state
pub fn entry_code_exists(store: &Store, entry_code: &str) -> bool {
    store.channels().any(|c| c.entry_code == entry_code)
}
