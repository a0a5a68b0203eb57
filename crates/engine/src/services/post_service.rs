use chrono::{DateTime, Utc};
use homeroom_store::Store;
use homeroom_types::{ChannelId, Post, PostId, Role, UserId};

use crate::authz::{require_role, Authorizer};
use crate::{selectors, EngineError};

/// Channel announcements, writable by the owning teacher and readable
/// by every member
#[derive(Default)]
pub struct PostService;

impl PostService {
    pub fn create_post(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        title: &str,
        content: &str,
    ) -> Result<Post, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;

        let post = store.transaction(|tx| {
            let post = Post {
                id: tx.next_id(),
                channel: channel_id,
                title: title.to_string(),
                content: content.to_string(),
                created_at: now,
            };
            tx.insert_post(post.clone());
            Ok::<_, EngineError>(post)
        })?;
        Ok(post)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_post(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        owner: UserId,
        channel_id: ChannelId,
        post_id: PostId,
        title: &str,
        content: &str,
    ) -> Result<Post, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;

        let mut post = selectors::posts::post_in_channel(store, post_id, channel_id)
            .ok_or(EngineError::PostNotFound)?;
        post.title = title.to_string();
        post.content = content.to_string();
        store.transaction(|tx| tx.set_post(post.clone()).map_err(EngineError::from))?;
        Ok(post)
    }

    pub fn delete_post(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        owner: UserId,
        channel_id: ChannelId,
        post_id: PostId,
    ) -> Result<(), EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;

        selectors::posts::post_in_channel(store, post_id, channel_id)
            .ok_or(EngineError::PostNotFound)?;
        store.transaction(|tx| tx.remove_post(post_id).map_err(EngineError::from))
    }

    /// Newest first; visible to the owner and to members
    pub fn list_posts(
        &self,
        store: &Store,
        caller: UserId,
        channel_id: ChannelId,
    ) -> Result<Vec<Post>, EngineError> {
        selectors::users::active_user(store, caller).ok_or(EngineError::UserNotFound)?;
        let channel = store.get_channel(channel_id).ok_or(EngineError::ChannelNotFound)?;
        if !channel.is_live() {
            return Err(EngineError::ChannelNotFound);
        }

        let is_owner = channel.owner == caller;
        let is_member =
            selectors::user_channels::live_membership(store, channel_id, caller).is_some();
        if !is_owner && !is_member {
            return Err(EngineError::MembershipNotFound);
        }
        Ok(selectors::posts::posts_in_channel(store, channel_id))
    }
}
