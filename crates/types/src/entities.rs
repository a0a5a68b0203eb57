use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ChannelId, ItemId, JobId, Point, PostId, Role, StockId, TradeType, UserChannelId, UserId,
    UserItemId, UserStockId,
};

/// Account lifecycle state
///
/// Deactivated accounts keep their rows for a grace window and are either
/// restored by a successful sign-in or removed by the nightly purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserState {
    Active,
    Deactivated { at: DateTime<Utc> },
}

impl UserState {
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deactivated { at } => Some(*at),
        }
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    pub password_hash: String,
    pub salt: String,
    pub role: Role,
    pub state: UserState,
}

impl User {
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// Channel lifecycle state
///
/// `Active -> PendingDeleted` is the only soft-delete entry; the stored job
/// handle points at the deferred hard-delete and is cancelled on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    Active,
    PendingDeleted {
        since: DateTime<Utc>,
        job: Option<JobId>,
    },
}

impl ChannelState {
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_pending_deleted(&self) -> bool {
        matches!(self, Self::PendingDeleted { .. })
    }

    pub const fn pending_job(&self) -> Option<JobId> {
        match self {
            Self::Active => None,
            Self::PendingDeleted { job, .. } => *job,
        }
    }
}

/// A teacher-owned classroom; the tenancy boundary for items, stocks,
/// posts and student membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub entry_code: String,
    pub owner: UserId,
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    pub state: ChannelState,
}

impl Channel {
    pub const fn is_live(&self) -> bool {
        self.state.is_active()
    }

    /// Trading window check, inclusive on both bounds
    pub fn market_is_open(&self, at: NaiveTime) -> bool {
        self.market_open <= at && at <= self.market_close
    }
}

/// Membership pivot carrying the member's point balance for the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChannel {
    pub id: UserChannelId,
    pub user: UserId,
    pub channel: ChannelId,
    pub point: Point,
}

/// A shop catalog entry; `amount` is the remaining shop stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub channel: ChannelId,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub amount: u64,
    pub price: Point,
}

/// A student's inventory row for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserItem {
    pub id: UserItemId,
    pub user: UserId,
    pub item: ItemId,
    /// Purchased but not yet used
    pub amount: u64,
    /// Consumed units
    pub used_amount: u64,
}

impl UserItem {
    /// Fully consumed: everything bought has been used. A repurchase makes
    /// the row not-used again because `amount` rises above zero.
    pub const fn is_used(&self) -> bool {
        self.amount == 0 && self.used_amount > 0
    }
}

/// Append-only usage ledger row, one per use invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserItemLog {
    pub id: u64,
    pub user_item: UserItemId,
    pub amount: u64,
    pub used_at: DateTime<Utc>,
}

/// A tradable stock belonging to one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    pub channel: ChannelId,
    pub name: String,
    /// Current tradable price
    pub purchase_price: Point,
    pub prev_day_purchase_price: Point,
    /// Staged price, applied by the scheduled rollover
    pub next_day_purchase_price: Point,
    /// Fraction in [0, 1], applied on sell
    pub tax: f64,
    pub standard: String,
    pub content: String,
    /// Pending rollover job, replaced when the price is re-staged
    pub rollover_job: Option<JobId>,
}

impl Stock {
    pub const fn has_staged_price(&self) -> bool {
        self.next_day_purchase_price != self.purchase_price
    }
}

/// A student's share holding for one stock; may reach zero but is never
/// implicitly deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStock {
    pub id: UserStockId,
    pub user: UserId,
    pub stock: StockId,
    pub total_stock_amount: u64,
}

/// Append-only trade ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTradeInfo {
    pub id: u64,
    pub user: UserId,
    pub stock: StockId,
    pub trade_date: NaiveDate,
    pub trade_type: TradeType,
    /// Execution price
    pub price: Point,
    pub amount: u64,
}

/// Daily per-stock aggregate captured by the scheduled sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrice {
    pub id: u64,
    pub stock: StockId,
    pub trade_date: NaiveDate,
    /// Price at capture time
    pub price: Point,
    /// Sum of the day's trade amounts
    pub volume: u64,
    pub transaction_amount: u64,
}

/// One-time teacher signup code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub id: u64,
    pub code: String,
    pub is_verified: bool,
}

/// Channel announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub channel: ChannelId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
