use homeroom_store::Store;
use homeroom_types::{ChannelId, Post, PostId};

pub fn post_in_channel(store: &Store, post_id: PostId, channel_id: ChannelId) -> Option<Post> {
    store.get_post(post_id).filter(|p| p.channel == channel_id)
}

/// A channel's announcements, newest first
pub fn posts_in_channel(store: &Store, channel_id: ChannelId) -> Vec<Post> {
    let mut posts: Vec<Post> = store
        .posts()
        .filter(|p| p.channel == channel_id)
        .cloned()
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}
