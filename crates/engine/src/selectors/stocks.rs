use chrono::NaiveDate;
use homeroom_store::Store;
use homeroom_types::{ChannelId, Stock, StockId, UserId, UserStock};

pub fn stock_in_channel(store: &Store, stock_id: StockId, channel_id: ChannelId) -> Option<Stock> {
    store
        .get_stock(stock_id)
        .filter(|s| s.channel == channel_id)
}

/// The named stocks of one channel; the caller compares the count
/// against the input length
pub fn stocks_in_channel(
    store: &Store,
    channel_id: ChannelId,
    stock_ids: &[StockId],
) -> Vec<Stock> {
    stock_ids
        .iter()
        .filter_map(|id| stock_in_channel(store, *id, channel_id))
        .collect()
}

/// A student's holding for one stock
pub fn holding(store: &Store, user: UserId, stock: StockId) -> Option<UserStock> {
    store
        .user_stocks()
        .find(|us| us.user == user && us.stock == stock)
        .cloned()
}

/// Sum of trade amounts for one stock on one day; zero when no trades
pub fn traded_volume_on(store: &Store, stock: StockId, date: NaiveDate) -> u64 {
    store
        .trade_infos()
        .filter(|t| t.stock == stock && t.trade_date == date)
        .map(|t| t.amount)
        .sum()
}
