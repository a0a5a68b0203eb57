use serde::{Deserialize, Serialize};

/// All entity ids are drawn from a single store-wide sequence
pub type UserId = u64;
pub type ChannelId = u64;
pub type UserChannelId = u64;
pub type ItemId = u64;
pub type UserItemId = u64;
pub type StockId = u64;
pub type UserStockId = u64;
pub type PostId = u64;

/// In-channel currency; never negative
pub type Point = u64;

/// Opaque handle to a scheduled job, returned by the scheduler and
/// accepted directly by cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// User role; exactly one per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Teacher,
    Student,
    Parent,
    Admin,
    SuperUser,
}

impl Role {
    pub const fn is_teacher(&self) -> bool {
        matches!(self, Self::Teacher)
    }

    pub const fn is_student(&self) -> bool {
        matches!(self, Self::Student)
    }
}

/// Trade direction, stored on every trade ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TradeType {
    Buy = 1,
    Sell = 2,
}

impl TradeType {
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }
}
