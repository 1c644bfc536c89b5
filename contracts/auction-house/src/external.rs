use commons::{Percentage, Token};
use concordium_std::*;

use crate::state::AuctionPhase;

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitParams {
    /// Anti-snipe window guaranteed after every late bid.
    pub time_buffer: Duration,
    /// Default reserve price of new auctions.
    pub reserve_price: Amount,
    /// Minimum raise of a bid over the current highest bid.
    pub min_bid_increment: Percentage,
    /// Length of a newly created auction.
    pub duration: Duration,
    /// Receiver of the auction proceeds.
    pub beneficiary: AccountAddress,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct CreateAuctionParams {
    /// Token to auction. The house must already hold it.
    pub token: Token,
    /// Reserve price. The configured default is used for `None` or zero.
    pub reserve_price: Option<Amount>,
    /// Auction start time. Immediate by default.
    pub start: Option<Timestamp>,
}

/// Public view of a single auction.
#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct AuctionView {
    pub token: Token,
    /// Current highest bid, zero before the first bid.
    pub amount: Amount,
    /// Current highest bidder.
    pub bidder: Option<AccountAddress>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub reserve_price: Amount,
    pub settled: bool,
    /// Phase at the time of the query.
    pub phase: AuctionPhase,
}

#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct TwapView {
    /// Time weighted average settlement price, `None` before the first settlement.
    pub twap: Option<Amount>,
    /// Number of settlements the average is computed over.
    pub samples: u32,
}

#[derive(Debug, Clone, SchemaType, Serialize, PartialEq, Eq)]
pub enum InternalValue {
    MinBidIncrement(Percentage),
    Duration(Duration),
    Beneficiary(AccountAddress),
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub enum ViewInternalValueParams {
    MinBidIncrement,
    Duration,
    Beneficiary,
}
