use homeroom_types::{ChannelId, StockId};
use serde::{Deserialize, Serialize};

/// Deferred work submitted to the scheduler
///
/// Job bodies call back into the engine; the scheduler itself knows
/// nothing about the domain beyond these names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Hard-delete a channel whose pending-delete grace elapsed
    DeleteChannel { channel_id: ChannelId },
    /// Apply a staged next-day purchase price
    PriceRollover {
        stock_id: StockId,
        channel_id: ChannelId,
    },
    /// Record the daily per-stock trade aggregates
    DailyPriceSweep,
    /// Purge accounts deactivated past the grace window
    PurgeUsers,
}

impl JobKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeleteChannel { .. } => "delete_channel",
            Self::PriceRollover { .. } => "price_rollover",
            Self::DailyPriceSweep => "daily_price_sweep",
            Self::PurgeUsers => "purge_users",
        }
    }
}
