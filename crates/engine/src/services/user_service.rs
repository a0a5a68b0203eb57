use chrono::{DateTime, Days, Utc};
use homeroom_jobs::JobQueue;
use homeroom_store::Store;
use homeroom_types::{EconomyConfig, Event, Role, User, UserId, UserState};
use sha2::{Digest, Sha256};

use super::{ChannelService, ServiceContext, UserDraft};
use crate::{selectors, EngineError};

const SALT_LENGTH: usize = 16;

/// Accounts: signup with teacher verification, sign-in with
/// restore-on-login, soft deletion and the nightly purge.
#[derive(Default)]
pub struct UserService;

impl UserService {
    fn generate_salt() -> String {
        std::iter::repeat_with(fastrand::alphanumeric)
            .take(SALT_LENGTH)
            .collect()
    }

    fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify_password(user: &User, password: &str) -> bool {
        Self::hash_password(&user.salt, password) == user.password_hash
    }

    /// Teacher signups consume a one-time verification code; student and
    /// parent signups need none.
    pub fn create_user(
        &self,
        store: &mut Store,
        draft: UserDraft,
    ) -> Result<User, EngineError> {
        if selectors::users::username_exists(store, &draft.username) {
            return Err(EngineError::UsernameTaken);
        }

        let code = match draft.role {
            Role::Teacher => {
                let value = draft
                    .verification_code
                    .as_deref()
                    .ok_or(EngineError::InvalidVerificationCode)?;
                let code = selectors::verification_codes::code_by_value(store, value)
                    .filter(|c| !c.is_verified)
                    .ok_or(EngineError::InvalidVerificationCode)?;
                Some(code)
            }
            _ => None,
        };

        let salt = Self::generate_salt();
        let password_hash = Self::hash_password(&salt, &draft.password);
        let user = store.transaction(|tx| {
            if let Some(mut code) = code {
                code.is_verified = true;
                tx.set_verification_code(code)?;
            }
            let user = User {
                id: tx.next_id(),
                username: draft.username.clone(),
                nickname: draft.nickname.clone(),
                password_hash: password_hash.clone(),
                salt: salt.clone(),
                role: draft.role,
                state: UserState::Active,
            };
            tx.insert_user(user.clone());
            Ok::<_, EngineError>(user)
        })?;
        Ok(user)
    }

    /// Password sign-in. A deactivated account that signs in within the
    /// purge window is restored, along with a teacher's pending-deleted
    /// channel.
    #[allow(clippy::too_many_arguments)]
    pub fn authenticate(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        channel_service: &ChannelService,
        queue: &dyn JobQueue,
        username: &str,
        password: &str,
    ) -> Result<User, EngineError> {
        let mut user =
            selectors::users::user_by_username(store, username).ok_or(EngineError::UserNotFound)?;
        if !Self::verify_password(&user, password) {
            return Err(EngineError::InvalidPassword);
        }

        if !user.is_active() {
            user.state = UserState::Active;
            store.transaction(|tx| tx.set_user(user.clone()).map_err(EngineError::from))?;
            if user.role.is_teacher() {
                channel_service.restore_channel(store, ctx, queue, user.id)?;
            }
            ctx.emit(Event::UserRestored { user: user.id });
        }
        Ok(user)
    }

    /// Change the nickname and optionally re-salt a new password
    pub fn update_user(
        &self,
        store: &mut Store,
        user_id: UserId,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<User, EngineError> {
        let mut user =
            selectors::users::active_user(store, user_id).ok_or(EngineError::UserNotFound)?;
        user.nickname = nickname.to_string();
        if let Some(password) = password {
            user.salt = Self::generate_salt();
            user.password_hash = Self::hash_password(&user.salt, password);
        }
        store.transaction(|tx| tx.set_user(user.clone()).map_err(EngineError::from))?;
        Ok(user)
    }

    /// Deactivate an account after re-checking the password. A teacher's
    /// live channel goes pending-deleted alongside; a student leaves
    /// their channel immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn soft_delete_user(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        channel_service: &ChannelService,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
        user_id: UserId,
        password: &str,
    ) -> Result<(), EngineError> {
        let mut user =
            selectors::users::active_user(store, user_id).ok_or(EngineError::UserNotFound)?;
        if !Self::verify_password(&user, password) {
            return Err(EngineError::InvalidPassword);
        }

        match user.role {
            Role::Teacher => {
                channel_service.pending_delete_owned(store, ctx, queue, config, now, user_id)?;
            }
            _ => {
                if let Some(membership) = selectors::user_channels::membership_by_user(store, user_id)
                {
                    store.transaction(|tx| {
                        tx.remove_membership_cascade(user_id, membership.channel)
                            .map_err(EngineError::from)
                    })?;
                    ctx.emit(Event::MemberRemoved {
                        channel_id: membership.channel,
                        user: user_id,
                    });
                }
            }
        }

        user.state = UserState::Deactivated { at: now };
        store.transaction(|tx| tx.set_user(user).map_err(EngineError::from))?;
        ctx.emit(Event::UserDeactivated { user: user_id, at: now });
        Ok(())
    }

    /// Job entry point for the nightly purge: hard-delete every account
    /// deactivated longer ago than the grace window, cancelling any
    /// delete still scheduled against an owned channel. Returns the
    /// number of purged accounts.
    pub fn hard_bulk_delete_users(
        &self,
        store: &mut Store,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let cutoff = now - Days::new(config.user_purge_after_days as u64);
        let expired = selectors::users::purgeable_users(store, cutoff);

        let mut stale_jobs = Vec::new();
        for user in &expired {
            for channel in store.channels().filter(|c| c.owner == user.id) {
                if let Some(job) = channel.state.pending_job() {
                    stale_jobs.push(job);
                }
                for stock in store.stocks().filter(|s| s.channel == channel.id) {
                    if let Some(job) = stock.rollover_job {
                        stale_jobs.push(job);
                    }
                }
            }
        }

        let purged = store.transaction(|tx| {
            for user in &expired {
                tx.remove_user_cascade(user.id)?;
            }
            Ok::<_, EngineError>(expired.len())
        })?;
        for job in stale_jobs {
            queue.cancel(job);
        }
        Ok(purged)
    }
}
