use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use homeroom_jobs::{JobKind, JobQueue};
use homeroom_store::Store;
use homeroom_types::{
    ChannelId, DailyPrice, EconomyConfig, Event, Point, Role, Stock, StockId, TradeType, UserId,
    UserStock, UserTradeInfo,
};

use super::{ServiceContext, StockDraft};
use crate::authz::{require_role, Authorizer};
use crate::{selectors, EngineError};

/// Stock market: teacher-managed listings with staged next-day prices,
/// student trading inside market hours, and the daily aggregates.
#[derive(Default)]
pub struct MarketService;

impl MarketService {
    fn require_market_closed(
        channel: &homeroom_types::Channel,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if channel.market_is_open(now.time()) {
            return Err(EngineError::MarketHoursViolation);
        }
        Ok(())
    }

    fn validate_tax(tax: f64) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&tax) {
            return Err(EngineError::InvalidTaxRate);
        }
        Ok(())
    }

    /// Delay until shortly after tomorrow's market open, when the staged
    /// price takes effect
    fn rollover_delay(now: DateTime<Utc>, market_open: NaiveTime, offset_secs: u64) -> Duration {
        let target = (now.date_naive() + Days::new(1)).and_time(market_open).and_utc()
            + TimeDelta::seconds(offset_secs as i64);
        (target - now).to_std().unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_stock(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        draft: StockDraft,
    ) -> Result<Stock, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;
        Self::validate_tax(draft.tax)?;

        let stock = store.transaction(|tx| {
            let stock = Stock {
                id: tx.next_id(),
                channel: channel_id,
                name: draft.name.clone(),
                purchase_price: draft.purchase_price,
                prev_day_purchase_price: draft.purchase_price,
                next_day_purchase_price: draft.purchase_price,
                tax: draft.tax,
                standard: draft.standard.clone(),
                content: draft.content.clone(),
                rollover_job: None,
            };
            tx.insert_stock(stock.clone());
            Ok::<_, EngineError>(stock)
        })?;
        Ok(stock)
    }

    /// Edit a listing. The new price does not apply immediately: it is
    /// staged and a rollover is scheduled for shortly after tomorrow's
    /// open. Re-staging replaces the previously scheduled rollover.
    #[allow(clippy::too_many_arguments)]
    pub fn update_stock(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        queue: &dyn JobQueue,
        config: &EconomyConfig,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        draft: StockDraft,
    ) -> Result<Stock, EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;
        Self::validate_tax(draft.tax)?;

        let mut stock = selectors::stocks::stock_in_channel(store, stock_id, channel_id)
            .ok_or(EngineError::StockNotFound)?;
        if let Some(job) = stock.rollover_job.take() {
            queue.cancel(job);
        }

        stock.name = draft.name;
        stock.tax = draft.tax;
        stock.standard = draft.standard;
        stock.content = draft.content;
        stock.next_day_purchase_price = draft.purchase_price;

        let job = if stock.has_staged_price() {
            Some(queue.schedule(
                JobKind::PriceRollover {
                    stock_id,
                    channel_id,
                },
                Self::rollover_delay(now, channel.market_open, config.price_rollover_offset_secs),
            ))
        } else {
            None
        };
        stock.rollover_job = job;

        let result =
            store.transaction(|tx| tx.set_stock(stock.clone()).map_err(EngineError::from));
        if result.is_err() {
            if let Some(job) = job {
                queue.cancel(job);
            }
        }
        result?;
        Ok(stock)
    }

    /// Remove a batch of listings, their holdings and trade history; all
    /// ids resolve in the channel or nothing is removed.
    #[allow(clippy::too_many_arguments)]
    pub fn delete_stocks(
        &self,
        store: &mut Store,
        authorizer: &dyn Authorizer,
        queue: &dyn JobQueue,
        now: DateTime<Utc>,
        owner: UserId,
        channel_id: ChannelId,
        stock_ids: &[StockId],
    ) -> Result<(), EngineError> {
        let user = selectors::users::active_user(store, owner).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Teacher)?;
        let channel = selectors::channels::live_channel_by_id_and_owner(store, channel_id, owner)
            .ok_or(EngineError::ChannelNotFound)?;
        Self::require_market_closed(&channel, now)?;

        let stocks = selectors::stocks::stocks_in_channel(store, channel_id, stock_ids);
        if stocks.len() != stock_ids.len() {
            return Err(EngineError::StockNotFound);
        }

        store.transaction(|tx| {
            for stock in &stocks {
                tx.remove_stock_cascade(stock.id)?;
            }
            Ok::<_, EngineError>(())
        })?;
        for stock in &stocks {
            if let Some(job) = stock.rollover_job {
                queue.cancel(job);
            }
        }
        Ok(())
    }

    /// Buy shares at the current price; only inside market hours
    #[allow(clippy::too_many_arguments)]
    pub fn buy_stock(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        student: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        amount: u64,
    ) -> Result<(Point, u64), EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;
        let membership = selectors::user_channels::live_membership(store, channel_id, student)
            .ok_or(EngineError::MembershipNotFound)?;
        let stock = selectors::stocks::stock_in_channel(store, stock_id, channel_id)
            .ok_or(EngineError::StockNotFound)?;

        let channel = store.get_channel(channel_id).ok_or(EngineError::ChannelNotFound)?;
        if !channel.market_is_open(now.time()) {
            return Err(EngineError::MarketClosed);
        }

        let total_price = stock
            .purchase_price
            .checked_mul(amount)
            .ok_or(EngineError::Overflow)?;
        if membership.point < total_price {
            return Err(EngineError::InsufficientPoints);
        }

        let (new_balance, total_held) = store.transaction(|tx| {
            let mut pivot = tx
                .get_user_channel(membership.id)
                .ok_or(EngineError::MembershipNotFound)?;
            pivot.point = pivot
                .point
                .checked_sub(total_price)
                .ok_or(EngineError::InsufficientPoints)?;
            let new_balance = pivot.point;
            tx.set_user_channel(pivot)?;

            let total_held = match selectors::stocks::holding(tx, student, stock_id) {
                Some(mut holding) => {
                    holding.total_stock_amount = holding
                        .total_stock_amount
                        .checked_add(amount)
                        .ok_or(EngineError::Overflow)?;
                    let total = holding.total_stock_amount;
                    tx.set_user_stock(holding)?;
                    total
                }
                None => {
                    let holding = UserStock {
                        id: tx.next_id(),
                        user: student,
                        stock: stock_id,
                        total_stock_amount: amount,
                    };
                    tx.insert_user_stock(holding)?;
                    amount
                }
            };

            let trade = UserTradeInfo {
                id: tx.next_id(),
                user: student,
                stock: stock_id,
                trade_date: now.date_naive(),
                trade_type: TradeType::Buy,
                price: stock.purchase_price,
                amount,
            };
            tx.insert_trade(trade);
            Ok::<_, EngineError>((new_balance, total_held))
        })?;

        ctx.emit(Event::TradeExecuted {
            channel_id,
            stock_id,
            user: student,
            trade_type: TradeType::Buy,
            price: stock.purchase_price,
            amount,
            new_balance,
        });
        Ok((new_balance, total_held))
    }

    /// Sell shares at the current price; the proceeds are taxed by the
    /// stock's fraction, rounded down in the seller's disfavor.
    #[allow(clippy::too_many_arguments)]
    pub fn sell_stock(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
        student: UserId,
        channel_id: ChannelId,
        stock_id: StockId,
        amount: u64,
    ) -> Result<(Point, u64), EngineError> {
        let user =
            selectors::users::active_user(store, student).ok_or(EngineError::UserNotFound)?;
        require_role(authorizer, &user, Role::Student)?;
        let membership = selectors::user_channels::live_membership(store, channel_id, student)
            .ok_or(EngineError::MembershipNotFound)?;
        let stock = selectors::stocks::stock_in_channel(store, stock_id, channel_id)
            .ok_or(EngineError::StockNotFound)?;

        let channel = store.get_channel(channel_id).ok_or(EngineError::ChannelNotFound)?;
        if !channel.market_is_open(now.time()) {
            return Err(EngineError::MarketClosed);
        }

        let holding = selectors::stocks::holding(store, student, stock_id)
            .ok_or(EngineError::UserStockNotFound)?;
        if holding.total_stock_amount < amount {
            return Err(EngineError::InsufficientShares);
        }

        let gross = stock
            .purchase_price
            .checked_mul(amount)
            .ok_or(EngineError::Overflow)?;
        let tax_amount = ((gross as f64 * stock.tax).floor() as u64).min(gross);
        let net = gross - tax_amount;

        let (new_balance, total_held) = store.transaction(|tx| {
            let mut pivot = tx
                .get_user_channel(membership.id)
                .ok_or(EngineError::MembershipNotFound)?;
            pivot.point = pivot.point.checked_add(net).ok_or(EngineError::Overflow)?;
            let new_balance = pivot.point;
            tx.set_user_channel(pivot)?;

            let mut holding = tx
                .get_user_stock(holding.id)
                .ok_or(EngineError::UserStockNotFound)?;
            holding.total_stock_amount = holding
                .total_stock_amount
                .checked_sub(amount)
                .ok_or(EngineError::InsufficientShares)?;
            let total_held = holding.total_stock_amount;
            tx.set_user_stock(holding)?;

            let trade = UserTradeInfo {
                id: tx.next_id(),
                user: student,
                stock: stock_id,
                trade_date: now.date_naive(),
                trade_type: TradeType::Sell,
                price: stock.purchase_price,
                amount,
            };
            tx.insert_trade(trade);
            Ok::<_, EngineError>((new_balance, total_held))
        })?;

        ctx.emit(Event::TradeExecuted {
            channel_id,
            stock_id,
            user: student,
            trade_type: TradeType::Sell,
            price: stock.purchase_price,
            amount,
            new_balance,
        });
        Ok((new_balance, total_held))
    }

    /// Job entry point for the scheduled rollover: the staged price
    /// becomes current and yesterday's price is kept for display.
    pub fn update_stock_purchase_price(
        &self,
        store: &mut Store,
        ctx: &mut ServiceContext,
        stock_id: StockId,
    ) -> Result<(), EngineError> {
        let stock = store.get_stock(stock_id).ok_or(EngineError::StockNotFound)?;
        let old_price = stock.purchase_price;
        let new_price = stock.next_day_purchase_price;

        store.transaction(|tx| {
            let mut stock = tx.get_stock(stock_id).ok_or(EngineError::StockNotFound)?;
            stock.prev_day_purchase_price = stock.purchase_price;
            stock.purchase_price = stock.next_day_purchase_price;
            stock.rollover_job = None;
            tx.set_stock(stock)?;
            Ok::<_, EngineError>(())
        })?;

        ctx.emit(Event::PriceRolled {
            stock_id,
            old_price,
            new_price,
        });
        Ok(())
    }

    /// Job entry point for the end-of-day sweep: one aggregate row per
    /// stock. A stock that already has a row for the day is skipped, a
    /// failing stock does not stop the sweep. Returns the rows written.
    pub fn create_daily_price(
        &self,
        store: &mut Store,
        today: NaiveDate,
    ) -> Result<usize, EngineError> {
        let stocks: Vec<Stock> = store.stocks().cloned().collect();
        let mut written = 0;
        for stock in stocks {
            let volume = selectors::stocks::traded_volume_on(store, stock.id, today);
            let outcome = store.transaction(|tx| {
                let daily = DailyPrice {
                    id: tx.next_id(),
                    stock: stock.id,
                    trade_date: today,
                    price: stock.purchase_price,
                    volume,
                    transaction_amount: stock.purchase_price.saturating_mul(volume),
                };
                tx.insert_daily_price(daily)
            });
            if outcome.is_ok() {
                written += 1;
            }
        }
        Ok(written)
    }
}
