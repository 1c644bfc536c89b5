use commons::{
    AuctionId, Token, AUCTION_BID_TAG, AUCTION_CREATED_TAG, AUCTION_EXTENDED_TAG,
    AUCTION_SETTLED_TAG, CONFIG_UPDATED_TAG, PAUSED_TAG, UNPAUSED_TAG,
};
use concordium_std::*;

use crate::config::HouseConfig;

/// Auction creation event data.
#[derive(Debug)]
pub struct CreatedEvent<'a> {
    pub id: AuctionId,
    /// Auctioned token.
    pub token: &'a Token,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub reserve_price: Amount,
}

/// Bid event data.
#[derive(Debug)]
pub struct BidEvent<'a> {
    pub id: AuctionId,
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Bid amount.
    pub amount: Amount,
    /// Whether the bid extended the auction.
    pub extended: bool,
}

/// End time extension event data.
#[derive(Debug, Serial)]
pub struct ExtendedEvent {
    pub id: AuctionId,
    /// New auction end time.
    pub end_time: Timestamp,
}

/// Settlement event data.
#[derive(Debug)]
pub struct SettledEvent<'a> {
    pub id: AuctionId,
    /// Auction winner, `None` if nobody bid.
    pub winner: Option<AccountAddress>,
    /// Winning bid.
    pub amount: Amount,
    /// Token that changed hands.
    pub token: &'a Token,
}

// Field-order serialization, equivalent to `#[derive(Serial)]`, which cannot
// handle reference fields with concordium-std 4.
impl<'a> Serial for CreatedEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        self.id.serial(out)?;
        self.token.serial(out)?;
        self.start_time.serial(out)?;
        self.end_time.serial(out)?;
        self.reserve_price.serial(out)
    }
}

impl<'a> Serial for BidEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        self.id.serial(out)?;
        self.bidder.serial(out)?;
        self.amount.serial(out)?;
        self.extended.serial(out)
    }
}

impl<'a> Serial for SettledEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        self.id.serial(out)?;
        self.winner.serial(out)?;
        self.amount.serial(out)?;
        self.token.serial(out)
    }
}

/// Tagged auction house event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    Created(CreatedEvent<'a>),
    Bid(BidEvent<'a>),
    Extended(ExtendedEvent),
    Settled(SettledEvent<'a>),
    ConfigUpdated(&'a HouseConfig),
    Paused(Address),
    Unpaused(Address),
}

impl<'a> AuctionEvents<'a> {
    pub fn created(
        id: AuctionId,
        token: &'a Token,
        start_time: Timestamp,
        end_time: Timestamp,
        reserve_price: Amount,
    ) -> Self {
        Self::Created(CreatedEvent {
            id,
            token,
            start_time,
            end_time,
            reserve_price,
        })
    }

    pub fn bid(id: AuctionId, bidder: &'a AccountAddress, amount: Amount, extended: bool) -> Self {
        Self::Bid(BidEvent {
            id,
            bidder,
            amount,
            extended,
        })
    }

    pub fn extended(id: AuctionId, end_time: Timestamp) -> Self {
        Self::Extended(ExtendedEvent { id, end_time })
    }

    pub fn settled(
        id: AuctionId,
        winner: Option<AccountAddress>,
        amount: Amount,
        token: &'a Token,
    ) -> Self {
        Self::Settled(SettledEvent {
            id,
            winner,
            amount,
            token,
        })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::Created(event) => {
                out.write_u8(AUCTION_CREATED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Bid(event) => {
                out.write_u8(AUCTION_BID_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Extended(event) => {
                out.write_u8(AUCTION_EXTENDED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Settled(event) => {
                out.write_u8(AUCTION_SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::ConfigUpdated(config) => {
                out.write_u8(CONFIG_UPDATED_TAG)?;
                config.serial(out)
            }
            AuctionEvents::Paused(by) => {
                out.write_u8(PAUSED_TAG)?;
                by.serial(out)
            }
            AuctionEvents::Unpaused(by) => {
                out.write_u8(UNPAUSED_TAG)?;
                by.serial(out)
            }
        }
    }
}
