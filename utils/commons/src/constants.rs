/// Tag for the AuctionCreated event.
pub const AUCTION_CREATED_TAG: u8 = u8::MAX;

/// Tag for the AuctionBid event.
pub const AUCTION_BID_TAG: u8 = u8::MAX - 1;

/// Tag for the AuctionExtended event.
pub const AUCTION_EXTENDED_TAG: u8 = u8::MAX - 2;

/// Tag for the AuctionSettled event.
pub const AUCTION_SETTLED_TAG: u8 = u8::MAX - 3;

/// Tag for the ConfigUpdated event.
pub const CONFIG_UPDATED_TAG: u8 = u8::MAX - 4;

/// Tag for the Paused event.
pub const PAUSED_TAG: u8 = u8::MAX - 5;

/// Tag for the Unpaused event.
pub const UNPAUSED_TAG: u8 = u8::MAX - 6;

/// Number of settlement prices kept per asset class for the TWAP.
pub const TWAP_WINDOW: usize = 10;
