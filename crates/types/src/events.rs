use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, ItemId, Point, StockId, TradeType, UserId};

/// Domain events emitted during service execution
///
/// Events provide an audit trail of balance and ledger changes. They are
/// collected per service call and drained by the caller after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Channel events
    ChannelCreated {
        channel_id: ChannelId,
        owner: UserId,
    },
    MemberJoined {
        channel_id: ChannelId,
        user: UserId,
    },
    MemberRemoved {
        channel_id: ChannelId,
        user: UserId,
    },
    PointsGranted {
        channel_id: ChannelId,
        user: UserId,
        amount: Point,
        new_balance: Point,
    },
    ChannelPendingDeleted {
        channel_id: ChannelId,
        since: DateTime<Utc>,
    },
    ChannelRestored {
        channel_id: ChannelId,
    },
    ChannelDeleted {
        channel_id: ChannelId,
    },

    // Shop events
    ItemPurchased {
        channel_id: ChannelId,
        item_id: ItemId,
        user: UserId,
        amount: u64,
        total_price: Point,
        new_balance: Point,
    },
    ItemUsed {
        channel_id: ChannelId,
        item_id: ItemId,
        user: UserId,
        amount: u64,
    },

    // Market events
    TradeExecuted {
        channel_id: ChannelId,
        stock_id: StockId,
        user: UserId,
        trade_type: TradeType,
        price: Point,
        amount: u64,
        new_balance: Point,
    },
    PriceRolled {
        stock_id: StockId,
        old_price: Point,
        new_price: Point,
    },

    // Account events
    UserDeactivated {
        user: UserId,
        at: DateTime<Utc>,
    },
    UserRestored {
        user: UserId,
    },
}

impl Event {
    /// True for events that describe a point-balance mutation
    pub const fn is_ledger_event(&self) -> bool {
        matches!(
            self,
            Self::PointsGranted { .. } | Self::ItemPurchased { .. } | Self::TradeExecuted { .. }
        )
    }

    pub const fn is_channel_event(&self) -> bool {
        matches!(
            self,
            Self::ChannelCreated { .. }
                | Self::MemberJoined { .. }
                | Self::MemberRemoved { .. }
                | Self::ChannelPendingDeleted { .. }
                | Self::ChannelRestored { .. }
                | Self::ChannelDeleted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Events are the audit surface, so their JSON shape matters
    #[test]
    fn test_event_json_round_trip() {
        let event = Event::PointsGranted {
            channel_id: 1,
            user: 2,
            amount: 40,
            new_balance: 40,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("PointsGranted"));
        assert_eq!(serde_json::from_str::<Event>(&json).unwrap(), event);
        assert!(event.is_ledger_event());
        assert!(!event.is_channel_event());
    }
}
