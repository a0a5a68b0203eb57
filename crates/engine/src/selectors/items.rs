use homeroom_store::Store;
use homeroom_types::{ChannelId, Item, ItemId, UserId, UserItem};

pub fn item_in_channel(store: &Store, item_id: ItemId, channel_id: ChannelId) -> Option<Item> {
    store.get_item(item_id).filter(|i| i.channel == channel_id)
}

/// The named items of one channel; the caller compares the count against
/// the input length
pub fn items_in_channel(store: &Store, channel_id: ChannelId, item_ids: &[ItemId]) -> Vec<Item> {
    item_ids
        .iter()
        .filter_map(|id| item_in_channel(store, *id, channel_id))
        .collect()
}

/// A student's inventory row for one item
pub fn inventory(store: &Store, user: UserId, item: ItemId) -> Option<UserItem> {
    store
        .user_items()
        .find(|ui| ui.user == user && ui.item == item)
        .cloned()
}
