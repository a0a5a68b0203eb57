use homeroom_store::StoreError;
use thiserror::Error;

/// Engine errors
///
/// Every public service method either returns a success value or exactly
/// one of these kinds. The not-found family doubles as the terminal
/// classification for job-invoked paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("User not found")]
    UserNotFound,

    #[error("Channel does not exist")]
    ChannelNotFound,

    #[error("User channel does not exist")]
    MembershipNotFound,

    #[error("Item does not exist")]
    ItemNotFound,

    #[error("User item does not exist")]
    UserItemNotFound,

    #[error("Stock does not exist")]
    StockNotFound,

    #[error("User stock does not exist")]
    UserStockNotFound,

    #[error("Post does not exist")]
    PostNotFound,

    #[error("You already have a channel")]
    AlreadyHasChannel,

    #[error("You already joined a channel")]
    AlreadyMember,

    #[error("Entry code is invalid")]
    InvalidEntryCode,

    #[error("The channel owner can't be a target of this operation")]
    CannotRemoveOwner,

    #[error("Not every listed user belongs to the channel")]
    MembershipCountMismatch,

    #[error("Insufficient points")]
    InsufficientPoints,

    #[error("The amount of the item is insufficient")]
    InsufficientStock,

    #[error("The price of the item is incorrect")]
    PriceMismatch,

    #[error("Not enough unused units held")]
    InsufficientUnits,

    #[error("Not enough shares held")]
    InsufficientShares,

    #[error("Market is closed")]
    MarketClosed,

    #[error("Catalog edits are not allowed during market hours")]
    MarketHoursViolation,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Verification code is invalid")]
    InvalidVerificationCode,

    #[error("Password is invalid")]
    InvalidPassword,

    #[error("Tax must be a fraction between 0 and 1")]
    InvalidTaxRate,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Overflow in calculation")]
    Overflow,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// True for the errors that mean the referenced entity is absent or
    /// filtered out by visibility rules; job paths treat these as
    /// terminal, everything else as transient.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound
                | Self::ChannelNotFound
                | Self::MembershipNotFound
                | Self::ItemNotFound
                | Self::UserItemNotFound
                | Self::StockNotFound
                | Self::UserStockNotFound
                | Self::PostNotFound
        )
    }
}
