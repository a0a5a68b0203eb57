use std::time::Duration;

use chrono::{DateTime, Utc};
use homeroom_jobs::{JobKind, JobQueue};
use homeroom_store::Store;
use homeroom_types::{
    Channel, ChannelId, ChannelState, EconomyConfig, Event, Point, Role, UserChannel, UserId,
};

use super::ServiceContext;
use crate::authz::{require_role, Authorizer};
use crate::{selectors, EngineError};

const ENTRY_CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Channel lifecycle: creation, join-by-code, membership changes, point
/// grants and the pending-delete pipeline
#[derive(Default)]
pub struct ChannelService;

impl ChannelService {
    /// Draw random codes until one is free; after a bounded number of
    /// misses the code space is considered crowded and the length grows.
    fn generate_entry_code(store: &Store, config: &EconomyConfig) -> String {
        let mut length = config.entry_code_length;
        loop {
            for _ in 0..config.entry_code_max_attempts {
                let code: String = (0..length)
                    .map(|_| {
                        ENTRY_CODE_CHARSET[fastrand::usize(..ENTRY_CODE_CHARSET.len())] as char
                    })
                    .collect();
                if !selectors::channels::entry_code_exists(store, &code) {
                    return code;
                }
            }
            length += 1;
        }
    }

    pub fn create_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        config: &EconomyConfig,
        owner: UserId,
        name: &str,
    ) -> Result<Channel, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;

        if selectors::channels::live_channel_by_owner(store, owner).is_some() {
            return Err(EngineError::AlreadyHasChannel);
        }
        if selectors::user_channels::membership_by_user(store, owner).is_some() {
            return Err(EngineError::AlreadyMember);
        }

        let entry_code = Self::generate_entry_code(store, config);
        let channel = store.transaction(|tx| {
            let channel = Channel {
                id: tx.next_id(),
                name: name.to_string(),
                entry_code: entry_code.clone(),
                owner,
                market_open: config.default_market_open,
                market_close: config.default_market_close,
                state: ChannelState::Active,
            };
            tx.insert_channel(channel.clone())?;
            let pivot = UserChannel {
                id: tx.next_id(),
                user: owner,
                channel: channel.id,
                point: 0,
            };
            tx.insert_user_channel(pivot)?;
            Ok::<_, EngineError>(channel)
        })?;

        ctx.emit(Event::ChannelCreated {
            channel_id: channel.id,
            owner,
        });
        Ok(channel)
    }

    /// Joining is keyed on the entry code alone; pending-deleted channels
    /// are invisible here, so their codes read as invalid.
    pub fn join_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        student: UserId,
        entry_code: &str,
    ) -> Result<Channel, EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;

        if selectors::user_channels::membership_by_user(store, student).is_some() {
            return Err(EngineError::AlreadyMember);
        }
        let channel = selectors::channels::live_channel_by_entry_code(store, entry_code)
            .ok_or(EngineError::InvalidEntryCode)?;

        store.transaction(|tx| {
            let pivot = UserChannel {
                id: tx.next_id(),
                user: student,
                channel: channel.id,
                point: 0,
            };
            tx.insert_user_channel(pivot)?;
            Ok::<_, EngineError>(())
        })?;

        ctx.emit(Event::MemberJoined {
            channel_id: channel.id,
            user: student,
        });
        Ok(channel)
    }

    pub fn update_channel_name(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        owner: UserId,
        channel_id: ChannelId,
        name: &str,
    ) -> Result<Channel, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;

        let mut channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        channel.name = name.to_string();
        store.transaction(|tx| tx.set_channel(channel.clone()).map_err(EngineError::from))?;
        Ok(channel)
    }

    /// Flip the channel to pending-deleted and schedule the deferred hard
    /// delete. A second call on an already-pending channel is a no-op and
    /// schedules nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn pending_delete_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
    ) -> Result<(), EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;

        let channel = selectors::channels::channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        self.transition_to_pending(store, ctx, queue, config, now, channel)
    }

    /// Account-deactivation path: no role check, missing channel is fine.
    pub(crate) fn pending_delete_owned(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
        owner: UserId,
    ) -> Result<(), EngineError> {
        match selectors::channels::live_channel_by_owner(store, owner) {
            Some(channel) => self.transition_to_pending(store, ctx, queue, config, now, channel),
            None => Ok(()),
        }
    }

    fn transition_to_pending(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
        channel: Channel,
    ) -> Result<(), EngineError> {
        if channel.state.is_pending_deleted() {
            return Ok(());
        }

        let job = queue.schedule(
            JobKind::DeleteChannel {
                channel_id: channel.id,
            },
            Duration::from_secs(config.pending_delete_grace_secs),
        );
        let result = store.transaction(|tx| {
            let mut channel = tx.get_channel(channel.id).ok_or(EngineError::ChannelNotFound)?;
            channel.state = ChannelState::PendingDeleted {
                since: now,
                job: Some(job),
            };
            tx.set_channel(channel)?;
            Ok::<_, EngineError>(())
        });
        if result.is_err() {
            // the state never flipped, so the scheduled delete must not fire
            queue.cancel(job);
        }
        result?;

        ctx.emit(Event::ChannelPendingDeleted {
            channel_id: channel.id,
            since: now,
        });
        Ok(())
    }

    /// Bring the most recently pending-deleted channel of `owner` back to
    /// life and cancel its scheduled delete. No-op once the delete fired.
    pub(crate) fn restore_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        queue: &dyn JobQueue,
        owner: UserId,
    ) -> Result<(), EngineError> {
        let Some(channel) = selectors::channels::latest_pending_channel_by_owner(store, owner)
        else {
            return Ok(());
        };

        let job = channel.state.pending_job();
        store.transaction(|tx| {
            let mut channel = tx.get_channel(channel.id).ok_or(EngineError::ChannelNotFound)?;
            channel.state = ChannelState::Active;
            tx.set_channel(channel)?;
            Ok::<_, EngineError>(())
        })?;
        if let Some(job) = job {
            queue.cancel(job);
        }

        ctx.emit(Event::ChannelRestored {
            channel_id: channel.id,
        });
        Ok(())
    }

    /// Job entry point for the deferred hard delete. A channel that was
    /// restored in the meantime is out of reach of the stale job and
    /// reads as not found, which the runner treats as terminal.
    pub fn delete_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        channel_id: ChannelId,
    ) -> Result<(), EngineError> {
        let channel = store.get_channel(channel_id).ok_or(EngineError::ChannelNotFound)?;
        if !channel.state.is_pending_deleted() {
            return Err(EngineError::ChannelNotFound);
        }

        store.transaction(|tx| tx.remove_channel_cascade(channel_id).map_err(EngineError::from))?;
        ctx.emit(Event::ChannelDeleted { channel_id });
        Ok(())
    }

    pub fn leave_channel(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        student: UserId,
        channel_id: ChannelId,
    ) -> Result<(), EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;

        selectors::user_channels::live_membership(store, channel_id, student)
            .ok_or(EngineError::MembershipNotFound)?;
        store.transaction(|tx| {
            tx.remove_membership_cascade(student, channel_id)
                .map_err(EngineError::from)
        })?;

        ctx.emit(Event::MemberRemoved {
            channel_id,
            user: student,
        });
        Ok(())
    }

    /// Remove a set of members in one shot; all resolve or none leave.
    pub fn leave_users(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        owner: UserId,
        channel_id: ChannelId,
        user_ids: &[UserId],
    ) -> Result<(), EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;

        let memberships = selectors::user_channels::memberships_for_users(store, channel_id, user_ids);
        if memberships.len() != user_ids.len() {
            return Err(EngineError::MembershipCountMismatch);
        }
        if user_ids.contains(&owner) {
            return Err(EngineError::CannotRemoveOwner);
        }

        store.transaction(|tx| {
            for membership in &memberships {
                tx.remove_membership_cascade(membership.user, channel_id)?;
            }
            Ok::<_, EngineError>(())
        })?;

        for membership in &memberships {
            ctx.emit(Event::MemberRemoved {
                channel_id,
                user: membership.user,
            });
        }
        Ok(())
    }

    /// Grant the same number of points to a set of members. The owner's
    /// own pivot can never be a target.
    #[allow(clippy::too_many_arguments)]
    pub fn give_point_to_users(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        owner: UserId,
        channel_id: ChannelId,
        user_ids: &[UserId],
        point: Point,
    ) -> Result<Vec<UserChannel>, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;

        let memberships = selectors::user_channels::memberships_for_users(store, channel_id, user_ids);
        if memberships.len() != user_ids.len() {
            return Err(EngineError::MembershipCountMismatch);
        }
        if user_ids.contains(&owner) {
            return Err(EngineError::CannotRemoveOwner);
        }

        let updated = store.transaction(|tx| {
            let mut updated = Vec::with_capacity(memberships.len());
            for membership in &memberships {
                let mut row = tx
                    .get_user_channel(membership.id)
                    .ok_or(EngineError::MembershipNotFound)?;
                row.point = row.point.checked_add(point).ok_or(EngineError::Overflow)?;
                tx.set_user_channel(row.clone())?;
                updated.push(row);
            }
            Ok::<_, EngineError>(updated)
        })?;

        for row in &updated {
            ctx.emit(Event::PointsGranted {
                channel_id,
                user: row.user,
                amount: point,
                new_balance: row.point,
            });
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn charset_channel(store: &mut Store, entry_code: &str) -> Channel {
        Channel {
            id: store.next_id(),
            name: "class".to_string(),
            entry_code: entry_code.to_string(),
            owner: 1,
            market_open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            market_close: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            state: ChannelState::Active,
        }
    }

    #[test]
    fn test_entry_code_matches_configured_length() {
        let store = Store::new();
        let config = EconomyConfig::default();
        let code = ChannelService::generate_entry_code(&store, &config);
        assert_eq!(code.len(), config.entry_code_length);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_entry_code_widens_when_the_space_is_exhausted() {
        let mut store = Store::new();
        // occupy every 1-char code so no retry at that length can succeed
        for c in ENTRY_CODE_CHARSET {
            let channel = charset_channel(&mut store, &(*c as char).to_string());
            store.insert_channel(channel).unwrap();
        }

        let config = EconomyConfig {
            entry_code_length: 1,
            ..EconomyConfig::default()
        };
        let code = ChannelService::generate_entry_code(&store, &config);
        assert_eq!(code.len(), 2);
        assert!(!selectors::channels::entry_code_exists(&store, &code));
    }
}
