mod error;

pub use error::*;

use std::collections::BTreeMap;

use homeroom_types::{
    Channel, ChannelId, DailyPrice, Item, ItemId, Post, PostId, Stock, StockId, User, UserChannel,
    UserChannelId, UserId, UserItem, UserItemId, UserItemLog, UserStock, UserStockId,
    UserTradeInfo, VerificationCode,
};

/// In-memory transactional entity store
///
/// Implements the consumed contract of the relational database: typed
/// tables keyed by id, a single id sequence, per-table uniqueness
/// constraints and an all-or-nothing transaction scope. Row visibility
/// rules (pending-deleted channels, deactivated users) live in the
/// selector layer, not here.
#[derive(Debug, Default, Clone)]
pub struct Store {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    verification_codes: BTreeMap<u64, VerificationCode>,
    channels: BTreeMap<ChannelId, Channel>,
    user_channels: BTreeMap<UserChannelId, UserChannel>,
    items: BTreeMap<ItemId, Item>,
    user_items: BTreeMap<UserItemId, UserItem>,
    user_item_logs: BTreeMap<u64, UserItemLog>,
    stocks: BTreeMap<StockId, Stock>,
    user_stocks: BTreeMap<UserStockId, UserStock>,
    trade_infos: BTreeMap<u64, UserTradeInfo>,
    daily_prices: BTreeMap<u64, DailyPrice>,
    posts: BTreeMap<PostId, Post>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id from the store-wide sequence
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Run `f` against a draft copy of the store; commit the draft only if
    /// it returns `Ok`. The closure result is the transaction boundary:
    /// no partial effects are ever observable.
    pub fn transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut Store) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut draft = self.clone();
        let value = f(&mut draft)?;
        *self = draft;
        Ok(value)
    }

    // ============================================================================
    // Users and verification codes
    // ============================================================================

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn get_user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub fn set_user(&mut self, user: User) -> Result<(), StoreError> {
        match self.users.contains_key(&user.id) {
            true => {
                self.users.insert(user.id, user);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Hard-delete a user and everything hanging off the account: owned
    /// channels (with their full cascade), memberships, inventory,
    /// holdings and trade history.
    pub fn remove_user_cascade(&mut self, id: UserId) -> Result<(), StoreError> {
        self.users.remove(&id).ok_or(StoreError::RowNotFound)?;

        let owned: Vec<ChannelId> = self
            .channels
            .values()
            .filter(|c| c.owner == id)
            .map(|c| c.id)
            .collect();
        for channel_id in owned {
            self.remove_channel_cascade(channel_id)?;
        }

        self.user_channels.retain(|_, uc| uc.user != id);
        let removed_items: Vec<UserItemId> = self
            .user_items
            .values()
            .filter(|ui| ui.user == id)
            .map(|ui| ui.id)
            .collect();
        self.user_items.retain(|_, ui| ui.user != id);
        self.user_item_logs
            .retain(|_, log| !removed_items.contains(&log.user_item));
        self.user_stocks.retain(|_, us| us.user != id);
        self.trade_infos.retain(|_, t| t.user != id);
        Ok(())
    }

    pub fn insert_verification_code(&mut self, code: VerificationCode) {
        self.verification_codes.insert(code.id, code);
    }

    pub fn set_verification_code(&mut self, code: VerificationCode) -> Result<(), StoreError> {
        match self.verification_codes.contains_key(&code.id) {
            true => {
                self.verification_codes.insert(code.id, code);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn verification_codes(&self) -> impl Iterator<Item = &VerificationCode> {
        self.verification_codes.values()
    }

    // ============================================================================
    // Channels and memberships
    // ============================================================================

    pub fn insert_channel(&mut self, channel: Channel) -> Result<(), StoreError> {
        if self
            .channels
            .values()
            .any(|c| c.entry_code == channel.entry_code)
        {
            return Err(StoreError::UniqueViolation("channel.entry_code"));
        }
        self.channels.insert(channel.id, channel);
        Ok(())
    }

    pub fn get_channel(&self, id: ChannelId) -> Option<Channel> {
        self.channels.get(&id).cloned()
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<(), StoreError> {
        if !self.channels.contains_key(&channel.id) {
            return Err(StoreError::RowNotFound);
        }
        if self
            .channels
            .values()
            .any(|c| c.id != channel.id && c.entry_code == channel.entry_code)
        {
            return Err(StoreError::UniqueViolation("channel.entry_code"));
        }
        self.channels.insert(channel.id, channel);
        Ok(())
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Hard-delete a channel and every row scoped to it
    pub fn remove_channel_cascade(&mut self, id: ChannelId) -> Result<(), StoreError> {
        self.channels.remove(&id).ok_or(StoreError::RowNotFound)?;
        self.user_channels.retain(|_, uc| uc.channel != id);

        let item_ids: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| i.channel == id)
            .map(|i| i.id)
            .collect();
        self.items.retain(|_, i| i.channel != id);
        let removed_items: Vec<UserItemId> = self
            .user_items
            .values()
            .filter(|ui| item_ids.contains(&ui.item))
            .map(|ui| ui.id)
            .collect();
        self.user_items.retain(|_, ui| !item_ids.contains(&ui.item));
        self.user_item_logs
            .retain(|_, log| !removed_items.contains(&log.user_item));

        let stock_ids: Vec<StockId> = self
            .stocks
            .values()
            .filter(|s| s.channel == id)
            .map(|s| s.id)
            .collect();
        self.stocks.retain(|_, s| s.channel != id);
        self.user_stocks
            .retain(|_, us| !stock_ids.contains(&us.stock));
        self.trade_infos
            .retain(|_, t| !stock_ids.contains(&t.stock));
        self.daily_prices
            .retain(|_, dp| !stock_ids.contains(&dp.stock));

        self.posts.retain(|_, p| p.channel != id);
        Ok(())
    }

    pub fn insert_user_channel(&mut self, pivot: UserChannel) -> Result<(), StoreError> {
        if self
            .user_channels
            .values()
            .any(|uc| uc.user == pivot.user && uc.channel == pivot.channel)
        {
            return Err(StoreError::UniqueViolation("user_channel.user_channel"));
        }
        self.user_channels.insert(pivot.id, pivot);
        Ok(())
    }

    pub fn get_user_channel(&self, id: UserChannelId) -> Option<UserChannel> {
        self.user_channels.get(&id).cloned()
    }

    pub fn set_user_channel(&mut self, pivot: UserChannel) -> Result<(), StoreError> {
        match self.user_channels.contains_key(&pivot.id) {
            true => {
                self.user_channels.insert(pivot.id, pivot);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn user_channels(&self) -> impl Iterator<Item = &UserChannel> {
        self.user_channels.values()
    }

    /// Remove one membership plus the member's inventory, holdings and
    /// trade history scoped to that channel
    pub fn remove_membership_cascade(
        &mut self,
        user: UserId,
        channel: ChannelId,
    ) -> Result<(), StoreError> {
        let pivot_id = self
            .user_channels
            .values()
            .find(|uc| uc.user == user && uc.channel == channel)
            .map(|uc| uc.id)
            .ok_or(StoreError::RowNotFound)?;
        self.user_channels.remove(&pivot_id);

        let item_ids: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| i.channel == channel)
            .map(|i| i.id)
            .collect();
        let removed_items: Vec<UserItemId> = self
            .user_items
            .values()
            .filter(|ui| ui.user == user && item_ids.contains(&ui.item))
            .map(|ui| ui.id)
            .collect();
        self.user_items
            .retain(|_, ui| !(ui.user == user && item_ids.contains(&ui.item)));
        self.user_item_logs
            .retain(|_, log| !removed_items.contains(&log.user_item));

        let stock_ids: Vec<StockId> = self
            .stocks
            .values()
            .filter(|s| s.channel == channel)
            .map(|s| s.id)
            .collect();
        self.user_stocks
            .retain(|_, us| !(us.user == user && stock_ids.contains(&us.stock)));
        self.trade_infos
            .retain(|_, t| !(t.user == user && stock_ids.contains(&t.stock)));
        Ok(())
    }

    // ============================================================================
    // Items, inventory and usage logs
    // ============================================================================

    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn get_item(&self, id: ItemId) -> Option<Item> {
        self.items.get(&id).cloned()
    }

    pub fn set_item(&mut self, item: Item) -> Result<(), StoreError> {
        match self.items.contains_key(&item.id) {
            true => {
                self.items.insert(item.id, item);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn remove_item_cascade(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.items.remove(&id).ok_or(StoreError::RowNotFound)?;
        let removed_items: Vec<UserItemId> = self
            .user_items
            .values()
            .filter(|ui| ui.item == id)
            .map(|ui| ui.id)
            .collect();
        self.user_items.retain(|_, ui| ui.item != id);
        self.user_item_logs
            .retain(|_, log| !removed_items.contains(&log.user_item));
        Ok(())
    }

    pub fn insert_user_item(&mut self, inventory: UserItem) -> Result<(), StoreError> {
        if self
            .user_items
            .values()
            .any(|ui| ui.user == inventory.user && ui.item == inventory.item)
        {
            return Err(StoreError::UniqueViolation("user_item.user_item"));
        }
        self.user_items.insert(inventory.id, inventory);
        Ok(())
    }

    pub fn get_user_item(&self, id: UserItemId) -> Option<UserItem> {
        self.user_items.get(&id).cloned()
    }

    pub fn set_user_item(&mut self, inventory: UserItem) -> Result<(), StoreError> {
        match self.user_items.contains_key(&inventory.id) {
            true => {
                self.user_items.insert(inventory.id, inventory);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn user_items(&self) -> impl Iterator<Item = &UserItem> {
        self.user_items.values()
    }

    pub fn insert_user_item_log(&mut self, log: UserItemLog) {
        self.user_item_logs.insert(log.id, log);
    }

    pub fn user_item_logs(&self) -> impl Iterator<Item = &UserItemLog> {
        self.user_item_logs.values()
    }

    // ============================================================================
    // Stocks, holdings, trades and daily prices
    // ============================================================================

    pub fn insert_stock(&mut self, stock: Stock) {
        self.stocks.insert(stock.id, stock);
    }

    pub fn get_stock(&self, id: StockId) -> Option<Stock> {
        self.stocks.get(&id).cloned()
    }

    pub fn set_stock(&mut self, stock: Stock) -> Result<(), StoreError> {
        match self.stocks.contains_key(&stock.id) {
            true => {
                self.stocks.insert(stock.id, stock);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    pub fn remove_stock_cascade(&mut self, id: StockId) -> Result<(), StoreError> {
        self.stocks.remove(&id).ok_or(StoreError::RowNotFound)?;
        self.user_stocks.retain(|_, us| us.stock != id);
        self.trade_infos.retain(|_, t| t.stock != id);
        self.daily_prices.retain(|_, dp| dp.stock != id);
        Ok(())
    }

    pub fn insert_user_stock(&mut self, holding: UserStock) -> Result<(), StoreError> {
        if self
            .user_stocks
            .values()
            .any(|us| us.user == holding.user && us.stock == holding.stock)
        {
            return Err(StoreError::UniqueViolation("user_stock.user_stock"));
        }
        self.user_stocks.insert(holding.id, holding);
        Ok(())
    }

    pub fn get_user_stock(&self, id: UserStockId) -> Option<UserStock> {
        self.user_stocks.get(&id).cloned()
    }

    pub fn set_user_stock(&mut self, holding: UserStock) -> Result<(), StoreError> {
        match self.user_stocks.contains_key(&holding.id) {
            true => {
                self.user_stocks.insert(holding.id, holding);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn user_stocks(&self) -> impl Iterator<Item = &UserStock> {
        self.user_stocks.values()
    }

    pub fn insert_trade(&mut self, trade: UserTradeInfo) {
        self.trade_infos.insert(trade.id, trade);
    }

    pub fn trade_infos(&self) -> impl Iterator<Item = &UserTradeInfo> {
        self.trade_infos.values()
    }

    pub fn insert_daily_price(&mut self, daily: DailyPrice) -> Result<(), StoreError> {
        if self
            .daily_prices
            .values()
            .any(|dp| dp.stock == daily.stock && dp.trade_date == daily.trade_date)
        {
            return Err(StoreError::UniqueViolation("daily_price.stock_trade_date"));
        }
        self.daily_prices.insert(daily.id, daily);
        Ok(())
    }

    pub fn daily_prices(&self) -> impl Iterator<Item = &DailyPrice> {
        self.daily_prices.values()
    }

    // ============================================================================
    // Posts
    // ============================================================================

    pub fn insert_post(&mut self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn get_post(&self, id: PostId) -> Option<Post> {
        self.posts.get(&id).cloned()
    }

    pub fn set_post(&mut self, post: Post) -> Result<(), StoreError> {
        match self.posts.contains_key(&post.id) {
            true => {
                self.posts.insert(post.id, post);
                Ok(())
            }
            false => Err(StoreError::RowNotFound),
        }
    }

    pub fn remove_post(&mut self, id: PostId) -> Result<(), StoreError> {
        self.posts.remove(&id).ok_or(StoreError::RowNotFound)?;
        Ok(())
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }
}
