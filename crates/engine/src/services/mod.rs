// Domain services - each service handles a specific domain concern
//
// Services compose selectors, validate against the business rules, and
// write through the entity store inside one transaction per call.

mod channel_service;
mod market_service;
mod post_service;
mod shop_service;
mod user_service;

pub use channel_service::ChannelService;
pub use market_service::MarketService;
pub use post_service::PostService;
pub use shop_service::ShopService;
pub use user_service::UserService;

use homeroom_types::{Event, Point};
use serde::{Deserialize, Serialize};

/// Service context shared across all domain services
#[derive(Default)]
pub struct ServiceContext {
    /// Event collector for the current service call
    events: Vec<Event>,
}

impl ServiceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a domain event
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Take all emitted events
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// Catalog fields for creating or updating a shop item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub amount: u64,
    pub price: Point,
}

/// Catalog fields for creating or updating a stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDraft {
    pub name: String,
    pub purchase_price: Point,
    /// Fraction in [0, 1]
    pub tax: f64,
    pub standard: String,
    pub content: String,
}

/// Signup fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub nickname: String,
    pub password: String,
    pub role: homeroom_types::Role,
    pub verification_code: Option<String>,
}
