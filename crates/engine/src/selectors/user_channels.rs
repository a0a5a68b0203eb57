use homeroom_store::Store;
use homeroom_types::{ChannelId, UserChannel, UserId};

/// Membership in any live channel; keyed on the user alone because a
/// student belongs to at most one channel system-wide
pub fn membership_by_user(store: &Store, user: UserId) -> Option<UserChannel> {
    store
        .user_channels()
        .find(|uc| {
            uc.user == user
                && store
                    .get_channel(uc.channel)
                    .is_some_and(|c| c.is_live())
        })
        .cloned()
}

/// Membership in one specific live channel
pub fn live_membership(store: &Store, channel_id: ChannelId, user: UserId) -> Option<UserChannel> {
    store
        .get_channel(channel_id)
        .filter(|c| c.is_live())
        .and_then(|_| {
            store
                .user_channels()
                .find(|uc| uc.channel == channel_id && uc.user == user)
                .cloned()
        })
}

/// Memberships of the named users in one channel, in input order where
/// they resolve; the caller compares the count against the input length
pub fn memberships_for_users(
    store: &Store,
    channel_id: ChannelId,
    user_ids: &[UserId],
) -> Vec<UserChannel> {
    user_ids
        .iter()
        .filter_map(|user| {
            store
                .user_channels()
                .find(|uc| uc.channel == channel_id && uc.user == *user)
                .cloned()
        })
        .collect()
}
