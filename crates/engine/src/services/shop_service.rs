use chrono::{DateTime, Utc};
use homeroom_store::Store;
use homeroom_types::{
    ChannelId, Event, Item, ItemId, Point, Role, UserId, UserItem, UserItemLog,
};

use super::{ItemDraft, ServiceContext};
use crate::authz::{require_role, Authorizer};
use crate::{selectors, EngineError};

/// Shop catalog and inventory: teachers manage items outside market
/// hours, students spend points on them any time.
#[derive(Default)]
pub struct ShopService;

impl ShopService {
    /// Catalog edits are frozen while the market is open
    fn require_market_closed(
        channel: &homeroom_types::Channel,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if channel.market_is_open(now.time()) {
            return Err(EngineError::MarketHoursViolation);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_item(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        draft: ItemDraft,
    ) -> Result<Item, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;

        let item = store.transaction(|tx| {
            let item = Item {
                id: tx.next_id(),
                channel: channel_id,
                title: draft.title.clone(),
                content: draft.content.clone(),
                image_url: draft.image_url.clone(),
                amount: draft.amount,
                price: draft.price,
            };
            tx.insert_item(item.clone());
            Ok::<_, EngineError>(item)
        })?;
        Ok(item)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_item(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        draft: ItemDraft,
    ) -> Result<Item, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;

        let mut item = selectors::items::item_in_channel(store, item_id, channel_id)
            .ok_or(EngineError::ItemNotFound)?;
        item.title = draft.title;
        item.content = draft.content;
        item.image_url = draft.image_url;
        item.amount = draft.amount;
        item.price = draft.price;
        store.transaction(|tx| tx.set_item(item.clone()).map_err(EngineError::from))?;
        Ok(item)
    }

    /// Remove a batch of items and every inventory row hanging off them;
    /// all ids resolve in the channel or nothing is removed.
    #[allow(clippy::too_many_arguments)]
    pub fn delete_items(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        item_ids: &[ItemId],
    ) -> Result<(), EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;

        let items = selectors::items::items_in_channel(store, channel_id, item_ids);
        if items.len() != item_ids.len() {
            return Err(EngineError::ItemNotFound);
        }

        store.transaction(|tx| {
            for item in &items {
                tx.remove_item_cascade(item.id)?;
            }
            Ok::<_, EngineError>(())
        })
    }

    /// Purchase `amount` units at the price the buyer saw. The expected
    /// price guards against a concurrent catalog edit between read and
    /// purchase.
    #[allow(clippy::too_many_arguments)]
    pub fn buy_item(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        student: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        amount: u64,
        expected_price: Point,
    ) -> Result<UserItem, EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;
        let membership = selectors::user_channels::live_membership(store, channel_id, student)
            .ok_or(EngineError::MembershipNotFound)?;
        let item = selectors::items::item_in_channel(store, item_id, channel_id)
            .ok_or(EngineError::ItemNotFound)?;

        if item.amount < amount {
            return Err(EngineError::InsufficientStock);
        }
        if item.price != expected_price {
            return Err(EngineError::PriceMismatch);
        }
        let total_price = item
            .price
            .checked_mul(amount)
            .ok_or(EngineError::Overflow)?;
        if membership.point < total_price {
            return Err(EngineError::InsufficientPoints);
        }

        let (inventory, new_balance) = store.transaction(|tx| {
            let mut pivot = tx
                .get_user_channel(membership.id)
                .ok_or(EngineError::MembershipNotFound)?;
            pivot.point = pivot
                .point
                .checked_sub(total_price)
                .ok_or(EngineError::InsufficientPoints)?;
            let new_balance = pivot.point;
            tx.set_user_channel(pivot)?;

            let mut item = tx.get_item(item.id).ok_or(EngineError::ItemNotFound)?;
            item.amount = item
                .amount
                .checked_sub(amount)
                .ok_or(EngineError::InsufficientStock)?;
            tx.set_item(item)?;

            let inventory = match selectors::items::inventory(tx, student, item_id) {
                Some(mut row) => {
                    row.amount = row.amount.checked_add(amount).ok_or(EngineError::Overflow)?;
                    tx.set_user_item(row.clone())?;
                    row
                }
                None => {
                    let row = UserItem {
                        id: tx.next_id(),
                        user: student,
                        item: item_id,
                        amount,
                        used_amount: 0,
                    };
                    tx.insert_user_item(row.clone())?;
                    row
                }
            };
            Ok::<_, EngineError>((inventory, new_balance))
        })?;

        ctx.emit(Event::ItemPurchased {
            channel_id,
            item_id,
            user: student,
            amount,
            total_price,
            new_balance,
        });
        Ok(inventory)
    }

    /// Consume `amount` unused units and append one usage-log row
    #[allow(clippy::too_many_arguments)]
    pub fn use_item(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        student: UserId,
        channel_id: ChannelId,
        item_id: ItemId,
        amount: u64,
    ) -> Result<UserItem, EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;
        selectors::user_channels::live_membership(store, channel_id, student)
            .ok_or(EngineError::MembershipNotFound)?;
        selectors::items::item_in_channel(store, item_id, channel_id)
            .ok_or(EngineError::ItemNotFound)?;

        let inventory = selectors::items::inventory(store, student, item_id)
            .ok_or(EngineError::UserItemNotFound)?;
        if inventory.amount < amount {
            return Err(EngineError::InsufficientUnits);
        }

        let inventory = store.transaction(|tx| {
            let mut row = tx
                .get_user_item(inventory.id)
                .ok_or(EngineError::UserItemNotFound)?;
            row.amount = row
                .amount
                .checked_sub(amount)
                .ok_or(EngineError::InsufficientUnits)?;
            row.used_amount = row
                .used_amount
                .checked_add(amount)
                .ok_or(EngineError::Overflow)?;
            tx.set_user_item(row.clone())?;

            let log = UserItemLog {
                id: tx.next_id(),
                user_item: row.id,
                amount,
                used_at: now,
            };
            tx.insert_user_item_log(log);
            Ok::<_, EngineError>(row)
        })?;

        ctx.emit(Event::ItemUsed {
            channel_id,
            item_id,
            user: student,
            amount,
        });
        Ok(inventory)
    }
}
