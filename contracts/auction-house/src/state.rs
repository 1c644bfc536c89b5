use commons::{
    AdminCap, AuctionId, Authority, ContractResult, CustomContractError, Percentage, Token,
};
use concordium_std::*;

use crate::config::HouseConfig;
use crate::external::{AuctionView, InitParams, TwapView};
use crate::price::PriceHistory;

/// Lifecycle phase of an auction at a given slot time.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub enum AuctionPhase {
    /// Start time is still in the future.
    Created,
    /// Accepting bids.
    Active,
    /// End time passed, waiting for settlement.
    Ended,
    /// Terminal.
    Settled,
}

#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct Bid {
    pub account: AccountAddress,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct Auction {
    /// Auctioned token.
    pub token: Token,
    /// Current highest bid. Accepted bids are never zero.
    pub highest_bid: Option<Bid>,
    pub start_time: Timestamp,
    /// Moves forward on late bids, never backwards.
    pub end_time: Timestamp,
    /// Smallest acceptable first bid.
    pub reserve_price: Amount,
    pub settled: bool,
}

/// Bid that must be returned to its owner.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct Refund {
    pub account: AccountAddress,
    pub amount: Amount,
}

/// Accepted bid, not yet applied. The caller executes the refund and then
/// commits `auction`; dropping it leaves the stored auction untouched.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct BidOutcome {
    pub auction: Auction,
    pub refund: Option<Refund>,
    /// Set when the bid pushed the end time forward.
    pub extended: bool,
}

/// Result of closing an auction.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The token goes to the winner, the winning amount to the beneficiary.
    Winner(Bid),
    /// Nobody bid, the token returns to the house owner.
    NoBids,
}

impl Auction {
    pub fn new(
        token: Token,
        reserve_price: Amount,
        start_time: Timestamp,
        duration: Duration,
    ) -> ContractResult<Self> {
        let end_time = start_time
            .checked_add(duration)
            .ok_or(CustomContractError::InvalidDuration)?;

        Ok(Self {
            token,
            highest_bid: None,
            start_time,
            end_time,
            reserve_price,
            settled: false,
        })
    }

    /// Current highest bid amount, zero before the first bid.
    pub fn amount(&self) -> Amount {
        self.highest_bid
            .as_ref()
            .map(|bid| bid.amount)
            .unwrap_or_else(Amount::zero)
    }

    pub fn bidder(&self) -> Option<AccountAddress> {
        self.highest_bid.as_ref().map(|bid| bid.account)
    }

    pub fn phase(&self, slot_time: Timestamp) -> AuctionPhase {
        if self.settled {
            AuctionPhase::Settled
        } else if slot_time < self.start_time {
            AuctionPhase::Created
        } else if slot_time < self.end_time {
            AuctionPhase::Active
        } else {
            AuctionPhase::Ended
        }
    }

    /// Validate a bid and compute the resulting auction record.
    pub fn place_bid(
        &self,
        bidder: AccountAddress,
        amount: Amount,
        slot_time: Timestamp,
        config: &HouseConfig,
    ) -> ContractResult<BidOutcome> {
        match self.phase(slot_time) {
            AuctionPhase::Created => bail!(CustomContractError::AuctionNotStarted),
            AuctionPhase::Active => (),
            AuctionPhase::Ended => bail!(CustomContractError::AuctionEnded),
            AuctionPhase::Settled => bail!(CustomContractError::AuctionSettled),
        }

        ensure!(amount > Amount::zero(), CustomContractError::BidTooLow);

        if let Some(bid) = &self.highest_bid {
            ensure!(amount > bid.amount, CustomContractError::BidTooLow);
            ensure!(
                Percentage::from_percent(100) + config.min_bid_increment
                    <= Percentage::of_amount(amount, bid.amount),
                CustomContractError::BidTooLow
            );
        } else {
            ensure!(amount >= self.reserve_price, CustomContractError::BidTooLow);
        }

        let mut auction = self.clone();

        // Late bids always leave at least `time_buffer` for counter-bids
        let remaining = self
            .end_time
            .timestamp_millis()
            .saturating_sub(slot_time.timestamp_millis());
        let extended = remaining < config.time_buffer.millis();
        if extended {
            auction.end_time = slot_time
                .checked_add(config.time_buffer)
                .ok_or(CustomContractError::InvalidDuration)?;
        }

        let refund = auction
            .highest_bid
            .replace(Bid {
                account: bidder,
                amount,
            })
            .map(|previous| Refund {
                account: previous.account,
                amount: previous.amount,
            });

        Ok(BidOutcome {
            auction,
            refund,
            extended,
        })
    }

    /// Close the auction. Only valid once, and only after the end time.
    pub fn settle(&mut self, slot_time: Timestamp) -> ContractResult<Settlement> {
        ensure!(!self.settled, CustomContractError::AlreadySettled);
        ensure!(
            slot_time >= self.end_time,
            CustomContractError::AuctionNotEnded
        );

        self.settled = true;

        Ok(match &self.highest_bid {
            Some(bid) => Settlement::Winner(bid.clone()),
            None => Settlement::NoBids,
        })
    }

    /// Length of the auction window in milliseconds.
    pub fn length(&self) -> Duration {
        Duration::from_millis(
            self.end_time
                .timestamp_millis()
                .saturating_sub(self.start_time.timestamp_millis()),
        )
    }

    pub fn view(&self, slot_time: Timestamp) -> AuctionView {
        AuctionView {
            token: self.token.clone(),
            amount: self.amount(),
            bidder: self.bidder(),
            start_time: self.start_time,
            end_time: self.end_time,
            reserve_price: self.reserve_price,
            settled: self.settled,
            phase: self.phase(slot_time),
        }
    }
}

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Addresses authorized to administer the house.
    pub authority: Authority<S>,
    /// Admin controlled settings.
    pub config: HouseConfig,
    /// Id of the next created auction.
    pub next_auction_id: AuctionId,
    /// All auctions, settled ones included.
    pub auctions: StateMap<AuctionId, Auction, S>,
    /// Tokens under an unsettled auction.
    pub tokens_in_auction: StateSet<Token, S>,
    /// Settlement prices per token contract.
    pub prices: StateMap<ContractAddress, PriceHistory, S>,
}

impl<S: HasStateApi> State<S> {
    /// Creates a new state with no auctions.
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        params: InitParams,
        origin: AccountAddress,
    ) -> Self {
        Self {
            authority: Authority::new(state_builder, Address::Account(origin)),
            config: HouseConfig::new(params),
            next_auction_id: 0,
            auctions: state_builder.new_map(),
            tokens_in_auction: state_builder.new_set(),
            prices: state_builder.new_map(),
        }
    }

    /// Check that a new auction for `token` could be created right now.
    pub fn ensure_auctionable(&self, token: &Token) -> ContractResult<()> {
        ensure!(!self.config.paused, CustomContractError::ContractPaused);
        ensure!(
            !self.tokens_in_auction.contains(token),
            CustomContractError::AuctionAlreadyExists
        );
        Ok(())
    }

    /// Register a new auction for a token held by the house.
    pub fn create_auction(
        &mut self,
        _cap: &AdminCap,
        token: Token,
        reserve_price: Option<Amount>,
        start: Timestamp,
    ) -> ContractResult<(AuctionId, Auction)> {
        self.ensure_auctionable(&token)?;
        ensure!(
            self.config.duration.millis() > 0,
            CustomContractError::InvalidDuration
        );

        let reserve_price = self.config.reserve_price_or_default(reserve_price);
        let auction = Auction::new(token.clone(), reserve_price, start, self.config.duration)?;

        self.tokens_in_auction.insert(token);

        let id = self.next_auction_id;
        self.next_auction_id += 1;
        self.auctions.insert(id, auction.clone());

        Ok((id, auction))
    }

    pub fn auction(&self, id: AuctionId) -> ContractResult<Auction> {
        self.auctions
            .get(&id)
            .map(|auction| (*auction).clone())
            .ok_or(CustomContractError::UnknownAuction)
    }

    /// Check a bid against the stored auction without applying it.
    pub fn bid(
        &self,
        id: AuctionId,
        bidder: AccountAddress,
        amount: Amount,
        slot_time: Timestamp,
    ) -> ContractResult<BidOutcome> {
        ensure!(!self.config.paused, CustomContractError::ContractPaused);
        self.auction(id)?
            .place_bid(bidder, amount, slot_time, &self.config)
    }

    /// Store the outcome of a bid whose refund has been paid.
    pub fn commit_bid(&mut self, id: AuctionId, auction: Auction) {
        self.auctions.insert(id, auction);
    }

    /// Mark the auction settled, release its token and record the final price.
    pub fn settle(
        &mut self,
        id: AuctionId,
        slot_time: Timestamp,
    ) -> ContractResult<(Auction, Settlement)> {
        let mut auction = self.auction(id)?;
        let settlement = auction.settle(slot_time)?;

        self.auctions.insert(id, auction.clone());
        self.tokens_in_auction.remove(&auction.token);

        let mut history = self
            .prices
            .get(&auction.token.contract)
            .map(|history| (*history).clone())
            .unwrap_or_default();
        history.record(auction.amount(), slot_time, auction.length());
        self.prices.insert(auction.token.contract, history);

        Ok((auction, settlement))
    }

    pub fn twap(&self, contract: &ContractAddress) -> TwapView {
        match self.prices.get(contract) {
            Some(history) => TwapView {
                twap: history.twap(),
                samples: history.len() as u32,
            },
            None => TwapView {
                twap: None,
                samples: 0,
            },
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis2::TokenIdVec;

    const SECOND: u64 = 1_000;
    const START: u64 = 1_000_000;
    const ALICE: AccountAddress = AccountAddress([10; 32]);
    const BOB: AccountAddress = AccountAddress([11; 32]);
    const NFT: ContractAddress = ContractAddress {
        index: 7,
        subindex: 0,
    };

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn config() -> HouseConfig {
        HouseConfig::new(InitParams {
            time_buffer: Duration::from_seconds(900),
            reserve_price: Amount::from_micro_ccd(100_000),
            min_bid_increment: Percentage::from_percent(5),
            duration: Duration::from_seconds(86_400),
            beneficiary: ALICE,
        })
    }

    fn fresh_auction() -> Auction {
        Auction::new(
            Token {
                contract: NFT,
                id: TokenIdVec(vec![0]),
            },
            Amount::from_micro_ccd(100_000),
            at(START),
            Duration::from_seconds(86_400),
        )
        .expect_report("Auction window should be valid")
    }

    #[concordium_test]
    fn test_phases() {
        let mut auction = fresh_auction();
        let end = auction.end_time.timestamp_millis();

        claim_eq!(auction.phase(at(START - 1)), AuctionPhase::Created);
        claim_eq!(auction.phase(at(START)), AuctionPhase::Active);
        claim_eq!(auction.phase(at(end - 1)), AuctionPhase::Active);
        claim_eq!(auction.phase(at(end)), AuctionPhase::Ended);

        let _ = auction.settle(at(end)).expect_report("Settlement should pass");
        claim_eq!(auction.phase(at(end)), AuctionPhase::Settled);
    }

    #[concordium_test]
    fn test_first_bid_against_reserve() {
        let auction = fresh_auction();

        claim_eq!(
            auction.place_bid(ALICE, Amount::from_micro_ccd(99_999), at(START), &config()),
            Err(CustomContractError::BidTooLow)
        );

        let outcome = auction
            .place_bid(ALICE, Amount::from_micro_ccd(100_000), at(START), &config())
            .expect_report("Bid at reserve should pass");
        claim_eq!(outcome.refund, None);
        claim!(!outcome.extended);
        claim_eq!(outcome.auction.amount(), Amount::from_micro_ccd(100_000));
        claim_eq!(outcome.auction.bidder(), Some(ALICE));
    }

    #[concordium_test]
    fn test_zero_bid_rejected_without_reserve() {
        let mut auction = fresh_auction();
        auction.reserve_price = Amount::zero();

        claim_eq!(
            auction.place_bid(ALICE, Amount::zero(), at(START), &config()),
            Err(CustomContractError::BidTooLow)
        );
    }

    #[concordium_test]
    fn test_increment_and_refund() {
        let auction = fresh_auction();
        let first = auction
            .place_bid(ALICE, Amount::from_micro_ccd(200_000), at(START), &config())
            .expect_report("First bid should pass")
            .auction;

        // Exactly 5% over 0.2
        let outcome = first
            .place_bid(BOB, Amount::from_micro_ccd(210_000), at(START + 1), &config())
            .expect_report("Bid at the minimum increment should pass");
        claim_eq!(
            outcome.refund,
            Some(Refund {
                account: ALICE,
                amount: Amount::from_micro_ccd(200_000),
            })
        );
        claim_eq!(outcome.auction.bidder(), Some(BOB));

        claim_eq!(
            outcome.auction.place_bid(
                ALICE,
                Amount::from_micro_ccd(205_000),
                at(START + 2),
                &config()
            ),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(
            first.place_bid(BOB, Amount::from_micro_ccd(209_999), at(START + 1), &config()),
            Err(CustomContractError::BidTooLow)
        );
    }

    #[concordium_test]
    fn test_equal_bid_rejected_with_zero_increment() {
        let mut config = config();
        config.min_bid_increment = Percentage::from_percent(0);

        let auction = fresh_auction()
            .place_bid(ALICE, Amount::from_micro_ccd(200_000), at(START), &config)
            .expect_report("First bid should pass")
            .auction;

        claim_eq!(
            auction.place_bid(BOB, Amount::from_micro_ccd(200_000), at(START), &config),
            Err(CustomContractError::BidTooLow)
        );
    }

    #[concordium_test]
    fn test_late_bid_extends_end_time() {
        let auction = fresh_auction();
        let end = auction.end_time.timestamp_millis();
        let now = end - 100 * SECOND;

        let outcome = auction
            .place_bid(ALICE, Amount::from_micro_ccd(200_000), at(now), &config())
            .expect_report("Late bid should pass");

        claim!(outcome.extended);
        claim_eq!(outcome.auction.end_time, at(now + 900 * SECOND));
        claim!(outcome.auction.end_time.timestamp_millis() - end >= 800 * SECOND);
    }

    #[concordium_test]
    fn test_early_bid_keeps_end_time() {
        let auction = fresh_auction();
        let end = auction.end_time;

        let outcome = auction
            .place_bid(
                ALICE,
                Amount::from_micro_ccd(200_000),
                at(end.timestamp_millis() - 900 * SECOND),
                &config(),
            )
            .expect_report("Bid should pass");

        claim!(!outcome.extended);
        claim_eq!(outcome.auction.end_time, end);
    }

    #[concordium_test]
    fn test_bid_outside_window() {
        let mut auction = fresh_auction();
        let end = auction.end_time.timestamp_millis();
        let amount = Amount::from_micro_ccd(200_000);

        claim_eq!(
            auction.place_bid(ALICE, amount, at(START - 1), &config()),
            Err(CustomContractError::AuctionNotStarted)
        );
        claim_eq!(
            auction.place_bid(ALICE, amount, at(end), &config()),
            Err(CustomContractError::AuctionEnded)
        );

        let _ = auction.settle(at(end)).expect_report("Settlement should pass");
        claim_eq!(
            auction.place_bid(ALICE, amount, at(end), &config()),
            Err(CustomContractError::AuctionSettled)
        );
    }

    #[concordium_test]
    fn test_settle_once_after_end() {
        let mut auction = fresh_auction()
            .place_bid(ALICE, Amount::from_micro_ccd(200_000), at(START), &config())
            .expect_report("Bid should pass")
            .auction;
        let end = auction.end_time.timestamp_millis();

        claim_eq!(
            auction.settle(at(end - 1)),
            Err(CustomContractError::AuctionNotEnded)
        );
        claim!(!auction.settled);

        claim_eq!(
            auction.settle(at(end)),
            Ok(Settlement::Winner(Bid {
                account: ALICE,
                amount: Amount::from_micro_ccd(200_000),
            }))
        );
        claim_eq!(
            auction.settle(at(end + 1)),
            Err(CustomContractError::AlreadySettled)
        );
    }

    #[concordium_test]
    fn test_settle_without_bids() {
        let mut auction = fresh_auction();
        let end = auction.end_time;

        claim_eq!(auction.settle(end), Ok(Settlement::NoBids));
        claim_eq!(auction.amount(), Amount::zero());
        claim_eq!(auction.bidder(), None);
    }
}
