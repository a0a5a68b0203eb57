//! Classroom economy engine
//!
//! The engine owns the entity store and exposes one method per domain
//! operation. Each call validates through the selectors, commits through
//! one store transaction, and leaves its domain events behind for the
//! caller to drain. Deferred work (channel hard-deletes, price
//! rollovers, the nightly sweeps) goes through the injected job queue
//! and comes back in through [`Engine::run_job`].

pub mod authz;
pub mod clock;
mod error;
pub mod selectors;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::EngineError;

use std::sync::{Arc, Mutex};

use homeroom_jobs::{JobError, JobKind, JobQueue, JobRunner};
use homeroom_store::Store;
use homeroom_types::{
    Channel, ChannelId, EconomyConfig, Event, Item, ItemId, Point, Post, PostId, Stock, StockId,
    User, UserChannel, UserId, UserItem,
};

use crate::authz::{Authorizer, RoleAuthorizer};
use crate::clock::{Clock, SystemClock};
use crate::services::{
    ChannelService, ItemDraft, MarketService, PostService, ServiceContext, ShopService,
    StockDraft, UserDraft, UserService,
};

/// The façade over the domain services
pub struct Engine {
    store: Store,
    config: EconomyConfig,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    queue: Arc<dyn JobQueue>,

    channels: ChannelService,
    shop: ShopService,
    market: MarketService,
    posts: PostService,
    users: UserService,

    ctx: ServiceContext,
}

impl Engine {
    pub fn new(
        store: Store,
        config: EconomyConfig,
        clock: Arc<dyn Clock>,
        authorizer: Arc<dyn Authorizer>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
            authorizer,
            queue,
            channels: ChannelService,
            shop: ShopService,
            market: MarketService,
            posts: PostService,
            users: UserService,
            ctx: ServiceContext::new(),
        }
    }

    /// Production wiring: system clock, role-based authorization and the
    /// default configuration
    pub fn with_defaults(queue: Arc<dyn JobQueue>) -> Self {
        Self::new(
            Store::new(),
            EconomyConfig::default(),
            Arc::new(SystemClock),
            Arc::new(RoleAuthorizer),
            queue,
        )
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Drain the events emitted since the last drain
    pub fn take_events(&mut self) -> Vec<Event> {
        self.ctx.take_events()
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub fn sign_up(&mut self, draft: UserDraft) -> Result<User, EngineError> {
        self.users.create_user(&mut self.store, draft)
    }

    pub fn sign_in(&mut self, username: &str, password: &str) -> Result<User, EngineError> {
        self.users.authenticate(
            &mut self.store,
            &mut self.ctx,
            &self.channels,
            self.queue.as_ref(),
            username,
            password,
        )
    }

    pub fn update_profile(
        &mut self,
        user_id: UserId,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<User, EngineError> {
        self.users
            .update_user(&mut self.store, user_id, nickname, password)
    }

    pub fn deactivate_account(
        &mut self,
        user_id: UserId,
        password: &str,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.users.soft_delete_user(
            &mut self.store,
            &mut self.ctx,
            &self.channels,
            self.queue.as_ref(),
            &self.config,
            now,
            user_id,
            password,
        )
    }

    // ========================================================================
    // Channels
    // ========================================================================

    pub fn create_channel(&mut self, owner: UserId, name: &str) -> Result<Channel, EngineError> {
        self.channels.create_channel(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            &self.config,
            owner,
            name,
        )
    }

    pub fn join_channel(
        &mut self,
        student: UserId,
        entry_code: &str,
    ) -> Result<Channel, EngineError> {
        self.channels.join_channel(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            student,
            entry_code,
        )
    }

    pub fn update_channel_name(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        name: &str,
    ) -> Result<Channel, EngineError> {
        self.channels.update_channel_name(
            &mut self.store,
            self.authorizer.as_ref(),
            owner,
            channel_id,
            name,
        )
    }

    pub fn pending_delete_channel(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.channels.pending_delete_channel(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            self.queue.as_ref(),
            &self.config,
            now,
            owner,
            channel_id,
        )
    }

    pub fn leave_channel(
        &mut self,
        student: UserId,
        channel_id: ChannelId,
    ) -> Result<(), EngineError> {
        self.channels.leave_channel(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            student,
            channel_id,
        )
    }

    pub fn leave_users(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        user_ids: &[UserId],
    ) -> Result<(), EngineError> {
        self.channels.leave_users(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            owner,
            channel_id,
            user_ids,
        )
    }

    pub fn give_point_to_users(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        user_ids: &[UserId],
        point: Point,
    ) -> Result<Vec<UserChannel>, EngineError> {
        self.channels.give_point_to_users(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            owner,
            channel_id,
            user_ids,
            point,
        )
    }

    // ========================================================================
    // Shop
    // ========================================================================

    pub fn create_item(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        draft: ItemDraft,
    ) -> Result<Item, EngineError> {
        let now = self.clock.now();
        self.shop.create_item(
            &mut self.store,
            self.authorizer.as_ref(),
            now,
            owner,
            channel_id,
            draft,
        )
    }

    pub fn update_item(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        draft: ItemDraft,
    ) -> Result<Item, EngineError> {
        let now = self.clock.now();
        self.shop.update_item(
            &mut self.store,
            self.authorizer.as_ref(),
            now,
            owner,
            channel_id,
            item_id,
            draft,
        )
    }

    pub fn delete_items(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        item_ids: &[ItemId],
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.shop.delete_items(
            &mut self.store,
            self.authorizer.as_ref(),
            now,
            owner,
            channel_id,
            item_ids,
        )
    }

    pub fn buy_item(
        &mut self,
        student: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        amount: u64,
        expected_price: Point,
    ) -> Result<UserItem, EngineError> {
        self.shop.buy_item(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            student,
            channel_id,
            item_id,
            amount,
            expected_price,
        )
    }

    pub fn use_item(
        &mut self,
        student: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        amount: u64,
    ) -> Result<UserItem, EngineError> {
        let now = self.clock.now();
        self.shop.use_item(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            now,
            student,
            channel_id,
            item_id,
            amount,
        )
    }

    // ========================================================================
    // Market
    // ========================================================================

    pub fn create_stock(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        draft: StockDraft,
    ) -> Result<Stock, EngineError> {
        let now = self.clock.now();
        self.market.create_stock(
            &mut self.store,
            self.authorizer.as_ref(),
            now,
            owner,
            channel_id,
            draft,
        )
    }

    pub fn update_stock(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        draft: StockDraft,
    ) -> Result<Stock, EngineError> {
        let now = self.clock.now();
        self.market.update_stock(
            &mut self.store,
            self.authorizer.as_ref(),
            self.queue.as_ref(),
            &self.config,
            now,
            owner,
            channel_id,
            stock_id,
            draft,
        )
    }

    pub fn delete_stocks(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        stock_ids: &[StockId],
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.market.delete_stocks(
            &mut self.store,
            self.authorizer.as_ref(),
            self.queue.as_ref(),
            now,
            owner,
            channel_id,
            stock_ids,
        )
    }

    /// Returns the new balance and the total shares now held
    pub fn buy_stock(
        &mut self,
        student: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        amount: u64,
    ) -> Result<(Point, u64), EngineError> {
        let now = self.clock.now();
        self.market.buy_stock(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            now,
            student,
            channel_id,
            stock_id,
            amount,
        )
    }

    /// Returns the new balance and the total shares now held
    pub fn sell_stock(
        &mut self,
        student: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        amount: u64,
    ) -> Result<(Point, u64), EngineError> {
        let now = self.clock.now();
        self.market.sell_stock(
            &mut self.store,
            &mut self.ctx,
            self.authorizer.as_ref(),
            now,
            student,
            channel_id,
            stock_id,
            amount,
        )
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub fn create_post(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        title: &str,
        content: &str,
    ) -> Result<Post, EngineError> {
        let now = self.clock.now();
        self.posts.create_post(
            &mut self.store,
            self.authorizer.as_ref(),
            now,
            owner,
            channel_id,
            title,
            content,
        )
    }

    pub fn update_post(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        post_id: PostId,
        title: &str,
        content: &str,
    ) -> Result<Post, EngineError> {
        self.posts.update_post(
            &mut self.store,
            self.authorizer.as_ref(),
            owner,
            channel_id,
            post_id,
            title,
            content,
        )
    }

    pub fn delete_post(
        &mut self,
        owner: UserId,
        channel_id: ChannelId,
        post_id: PostId,
    ) -> Result<(), EngineError> {
        self.posts.delete_post(
            &mut self.store,
            self.authorizer.as_ref(),
            owner,
            channel_id,
            post_id,
        )
    }

    pub fn list_posts(
        &self,
        caller: UserId,
        channel_id: ChannelId,
    ) -> Result<Vec<Post>, EngineError> {
        self.posts.list_posts(&self.store, caller, channel_id)
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    /// Dispatch a due job back into the owning service
    pub fn run_job(&mut self, job: &JobKind) -> Result<(), EngineError> {
        match job {
            JobKind::DeleteChannel { channel_id } => {
                self.channels
                    .delete_channel(&mut self.store, &mut self.ctx, *channel_id)
            }
            JobKind::PriceRollover { stock_id, .. } => self.market.update_stock_purchase_price(
                &mut self.store,
                &mut self.ctx,
                *stock_id,
            ),
            JobKind::DailyPriceSweep => {
                let today = self.clock.today();
                self.market
                    .create_daily_price(&mut self.store, today)
                    .map(|_| ())
            }
            JobKind::PurgeUsers => {
                let now = self.clock.now();
                self.users
                    .hard_bulk_delete_users(&mut self.store, self.queue.as_ref(), &self.config, now)
                    .map(|_| ())
            }
        }
    }
}

/// Adapter the scheduler calls into; not-found means the target vanished
/// legitimately and retrying cannot help
pub struct EngineRunner {
    engine: Arc<Mutex<Engine>>,
}

impl EngineRunner {
    pub fn new(engine: Arc<Mutex<Engine>>) -> Self {
        Self { engine }
    }
}

impl JobRunner for EngineRunner {
    fn run(&self, job: &JobKind) -> Result<(), JobError> {
        let mut engine = self.engine.lock().unwrap_or_else(|e| e.into_inner());
        match engine.run_job(job) {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Err(JobError::Terminal(err.to_string())),
            Err(err) => Err(JobError::Transient(err.to_string())),
        }
    }
}
