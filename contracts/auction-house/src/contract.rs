use commons::{
    AuctionId, AuthorityUpdateParams, AuthorityViewParams, ContractResult, CustomContractError,
};
use concordium_std::*;

use crate::cis2;
use crate::config::HouseConfig;
use crate::events::AuctionEvents;
use crate::external::*;
use crate::state::{BidOutcome, Settlement, State};

/// Initialize the auction house without auctions. The instantiating account becomes the first admin.
#[init(contract = "AuctionHouse", parameter = "InitParams")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        params.duration.millis() > 0,
        CustomContractError::InvalidDuration.into()
    );

    Ok(State::new(state_builder, params, ctx.init_origin()))
}

/// Put a token held by the house up for auction. Returns the new auction id.
///
///  It rejects if:
///  - Sender is not an admin.
///  - The house is paused.
///  - The token is already under an unsettled auction.
///  - The house does not hold the token, or the token contract can not be queried.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "createAuction",
    parameter = "CreateAuctionParams",
    return_value = "AuctionId",
    enable_logger
)]
fn create_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<AuctionId> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;
    let params = CreateAuctionParams::deserial(&mut ctx.parameter_cursor())?;

    host.state().ensure_auctionable(&params.token)?;
    cis2::ensure_custody(host, &params.token, Address::Contract(ctx.self_address()))?;

    let start = params
        .start
        .unwrap_or_else(|| ctx.metadata().slot_time());
    let (id, auction) =
        host.state_mut()
            .create_auction(&cap, params.token, params.reserve_price, start)?;

    logger.log(&AuctionEvents::created(
        id,
        &auction.token,
        auction.start_time,
        auction.end_time,
        auction.reserve_price,
    ))?;

    Ok(id)
}

/// Bid the attached amount on an auction. The previous highest bidder is refunded in the same call.
///
///  It rejects if:
///  - Sender is not an account.
///  - The house is paused.
///  - The auction is unknown, settled, not started or ended.
///  - The amount is below the reserve price or the minimum increment.
///  - The previous bid can not be refunded.
#[receive(
    mutable,
    payable,
    contract = "AuctionHouse",
    name = "bid",
    parameter = "AuctionId",
    enable_logger
)]
fn bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress);
    };
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;

    let BidOutcome {
        auction,
        refund,
        extended,
    } = host
        .state()
        .bid(id, bidder, amount, ctx.metadata().slot_time())?;

    // Nothing is stored until the previous bidder got their funds back
    if let Some(refund) = refund {
        host.invoke_transfer(&refund.account, refund.amount)
            .map_err(|_| CustomContractError::RefundFailed)?;
    }

    let end_time = auction.end_time;
    host.state_mut().commit_bid(id, auction);

    logger.log(&AuctionEvents::bid(id, &bidder, amount, extended))?;
    if extended {
        logger.log(&AuctionEvents::extended(id, end_time))?;
    }

    Ok(())
}

/// Settle an ended auction. The token goes to the winner and the winning bid to the beneficiary.
/// Without bids the token returns to the contract owner. Callable by anyone, also while paused.
///
///  It rejects if:
///  - The auction is unknown, already settled or not ended yet.
///  - The token or the proceeds can not be transferred.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "settle",
    parameter = "AuctionId",
    enable_logger
)]
fn settle<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;

    // State is committed before calling out to the token contract
    let (auction, settlement) = host.state_mut().settle(id, ctx.metadata().slot_time())?;
    let house = Address::Contract(ctx.self_address());

    match settlement {
        Settlement::Winner(bid) => {
            cis2::transfer_token(host, &auction.token, house, bid.account)
                .map_err(|_| CustomContractError::AssetTransferFailed)?;

            let beneficiary = host.state().config.beneficiary;
            host.invoke_transfer(&beneficiary, bid.amount)
                .map_err(|_| CustomContractError::PayoutFailed)?;
        }
        Settlement::NoBids => {
            cis2::transfer_token(host, &auction.token, house, ctx.owner())
                .map_err(|_| CustomContractError::AssetTransferFailed)?;
        }
    }

    logger.log(&AuctionEvents::settled(
        id,
        auction.bidder(),
        auction.amount(),
        &auction.token,
    ))?;

    Ok(())
}

/// Set the minimum time left for counter-bids after a late bid. Admin only.
///
///  It rejects if:
///  - Sender is not an admin.
///  - The buffer added to the current time overflows.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "setTimeBuffer",
    parameter = "Duration",
    enable_logger
)]
fn set_time_buffer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;
    let time_buffer = Duration::deserial(&mut ctx.parameter_cursor())?;

    let state = host.state_mut();
    state
        .config
        .set_time_buffer(&cap, time_buffer, ctx.metadata().slot_time())?;
    logger.log(&AuctionEvents::ConfigUpdated(&state.config))?;

    Ok(())
}

/// Set the reserve price of auctions created without one. Admin only.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "setDefaultReservePrice",
    parameter = "Amount",
    enable_logger
)]
fn set_default_reserve_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;
    let reserve_price = Amount::deserial(&mut ctx.parameter_cursor())?;

    let state = host.state_mut();
    state.config.set_default_reserve_price(&cap, reserve_price);
    logger.log(&AuctionEvents::ConfigUpdated(&state.config))?;

    Ok(())
}

/// Stop bidding and auction creation. Settlement stays available. Admin only.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "pause",
    enable_logger
)]
fn pause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;

    if host.state_mut().config.pause(&cap) {
        logger.log(&AuctionEvents::Paused(*cap.holder()))?;
    }

    Ok(())
}

/// Resume bidding and auction creation. Admin only.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "unpause",
    enable_logger
)]
fn unpause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;

    if host.state_mut().config.unpause(&cap) {
        logger.log(&AuctionEvents::Unpaused(*cap.holder()))?;
    }

    Ok(())
}

/// Function to manage the admin and maintainer lists. Admins hold every configuration and
/// auction right and may update both lists. Maintainers may only update the maintainer list.
///
///  It rejects if:
///  - Fails to parse `AuthorityUpdateParams` parameters.
///  - The admin list is updated by a sender that is not an admin.
///  - The maintainer list is updated by a sender that is neither an admin nor a maintainer.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "updateAuthority",
    parameter = "AuthorityUpdateParams"
)]
fn update_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<()> {
    let params = AuthorityUpdateParams::deserial(&mut ctx.parameter_cursor())?;
    host.state_mut()
        .authority
        .handle_update(ctx.sender(), params)
}

/// Function to view the admin or the maintainer list.
#[receive(
    contract = "AuctionHouse",
    name = "viewAuthority",
    parameter = "AuthorityViewParams",
    return_value = "Vec<Address>"
)]
fn view_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Vec<Address>> {
    let params = AuthorityViewParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().authority.handle_view(params))
}

/// Function to update values required for internal contract functionality. This includes:
/// - MinBidIncrement. Required raise of a bid over the current highest bid.
/// - Duration. Length of newly created auctions, running auctions keep their end time.
/// - Beneficiary. Account address that receives the auction proceeds.
///
///  It rejects if:
///  - Fails to parse `InternalValue` parameters.
///  - If sender is not one of the admins.
///  - The duration is zero.
#[receive(
    mutable,
    contract = "AuctionHouse",
    name = "updateInternalValue",
    parameter = "InternalValue",
    enable_logger
)]
fn update_internal_value<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let cap = host.state().authority.admin_cap(&ctx.sender())?;
    let params = InternalValue::deserial(&mut ctx.parameter_cursor())?;

    let state = host.state_mut();
    match params {
        InternalValue::MinBidIncrement(increment) => {
            state.config.set_min_bid_increment(&cap, increment)
        }
        InternalValue::Duration(duration) => {
            ensure!(duration.millis() > 0, CustomContractError::InvalidDuration);
            state.config.set_duration(&cap, duration)
        }
        InternalValue::Beneficiary(account) => state.config.set_beneficiary(&cap, account),
    }
    logger.log(&AuctionEvents::ConfigUpdated(&state.config))?;

    Ok(())
}

/// Function to view values required for internal contract functionality.
#[receive(
    contract = "AuctionHouse",
    name = "viewInternalValue",
    parameter = "ViewInternalValueParams",
    return_value = "InternalValue"
)]
fn view_internal_value<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<InternalValue> {
    let config = &host.state().config;
    let params = ViewInternalValueParams::deserial(&mut ctx.parameter_cursor())?;

    let value = match params {
        ViewInternalValueParams::MinBidIncrement => {
            InternalValue::MinBidIncrement(config.min_bid_increment)
        }
        ViewInternalValueParams::Duration => InternalValue::Duration(config.duration),
        ViewInternalValueParams::Beneficiary => InternalValue::Beneficiary(config.beneficiary),
    };

    Ok(value)
}

#[receive(contract = "AuctionHouse", name = "viewConfig", return_value = "HouseConfig")]
fn view_config<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<HouseConfig> {
    Ok(host.state().config.clone())
}

/// View an auction as of the current slot time.
#[receive(
    contract = "AuctionHouse",
    name = "viewAuction",
    parameter = "AuctionId",
    return_value = "AuctionView"
)]
fn view_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionView> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;
    let auction = host.state().auction(id)?;
    Ok(auction.view(ctx.metadata().slot_time()))
}

/// Time weighted average settlement price of tokens from the given contract.
#[receive(
    contract = "AuctionHouse",
    name = "viewTwap",
    parameter = "ContractAddress",
    return_value = "TwapView"
)]
fn view_twap<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<TwapView> {
    let contract = ContractAddress::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().twap(&contract))
}

#[concordium_cfg_test]
mod tests {
    use commons::test::{parse_and_check_mock, parse_and_ok_mock, reject_mock};
    use commons::{
        AuthorityField, AuthorityUpdateKind, ContractBalanceOfQueryParams,
        ContractBalanceOfQueryResponse, Percentage, Token, TransferParameter,
    };
    use concordium_cis2::{Receiver, TokenAmountU64, TokenIdVec};
    use concordium_std::*;
    use test_infrastructure::*;

    use crate::state::AuctionPhase;

    use super::*;

    const SECOND: u64 = 1_000;
    const START: u64 = 1_000_000;
    const DURATION: u64 = 86_400 * SECOND;
    const END: u64 = START + DURATION;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const OWNER: AccountAddress = AccountAddress([2; 32]);
    const BENEFICIARY: AccountAddress = AccountAddress([3; 32]);
    const ALICE: AccountAddress = AccountAddress([4; 32]);
    const BOB: AccountAddress = AccountAddress([5; 32]);

    const HOUSE: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };
    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 11,
        subindex: 0,
    };

    fn token(id: u8) -> Token {
        Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![id]),
        }
    }

    fn ccd(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn new_ctx<'a>(sender: Address, slot_time: u64) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_owner(OWNER)
            .set_self_address(HOUSE)
            .set_metadata_slot_time(Timestamp::from_timestamp_millis(slot_time));
        ctx
    }

    /// Host with 0.1 CCD reserve, 5% increment, 900s buffer and one day auctions.
    fn new_host() -> TestHost<State<TestStateApi>> {
        let params = InitParams {
            time_buffer: Duration::from_seconds(900),
            reserve_price: ccd(100_000),
            min_bid_increment: Percentage::from_percent(5),
            duration: Duration::from_millis(DURATION),
            beneficiary: BENEFICIARY,
        };
        let bytes = to_bytes(&params);
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let state = init(&ctx, &mut state_builder).expect_report("Failed during init_AuctionHouse");

        TestHost::new(state, state_builder)
    }

    fn setup_custody(host: &mut TestHost<State<TestStateApi>>, balance: u64) {
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            MockFn::new(move |parameter, _, _, _state| {
                let query = ContractBalanceOfQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                if query.queries.iter().any(|q| q.address != Address::Contract(HOUSE)) {
                    return Err(CallContractError::Trap);
                }
                Ok((
                    false,
                    Some(ContractBalanceOfQueryResponse::from(vec![TokenAmountU64(
                        balance,
                    )])),
                ))
            }),
        );
    }

    fn expect_token_transfer(host: &mut TestHost<State<TestStateApi>>, to: AccountAddress) {
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                move |params| {
                    params.0.len() == 1
                        && params.0[0].from == Address::Contract(HOUSE)
                        && matches!(params.0[0].to, Receiver::Account(account) if account == to)
                },
                (),
            ),
        );
    }

    fn create(
        host: &mut TestHost<State<TestStateApi>>,
        params: CreateAuctionParams,
        logger: &mut TestLogger,
    ) -> ContractResult<AuctionId> {
        let bytes = to_bytes(&params);
        let mut ctx = new_ctx(Address::Account(ADMIN), START);
        ctx.set_parameter(&bytes);
        create_auction(&ctx, host, logger)
    }

    fn create_default(host: &mut TestHost<State<TestStateApi>>) -> AuctionId {
        create(
            host,
            CreateAuctionParams {
                token: token(1),
                reserve_price: None,
                start: None,
            },
            &mut TestLogger::init(),
        )
        .expect_report("Auction creation should pass")
    }

    fn place_bid(
        host: &mut TestHost<State<TestStateApi>>,
        id: AuctionId,
        bidder: AccountAddress,
        amount: u64,
        slot_time: u64,
        logger: &mut TestLogger,
    ) -> ContractResult<()> {
        let bytes = to_bytes(&id);
        let mut ctx = new_ctx(Address::Account(bidder), slot_time);
        ctx.set_parameter(&bytes);
        bid(&ctx, host, ccd(amount), logger)
    }

    fn settle_at(
        host: &mut TestHost<State<TestStateApi>>,
        id: AuctionId,
        slot_time: u64,
        logger: &mut TestLogger,
    ) -> ContractResult<()> {
        let bytes = to_bytes(&id);
        let mut ctx = new_ctx(Address::Account(BOB), slot_time);
        ctx.set_parameter(&bytes);
        settle(&ctx, host, logger)
    }

    fn view(host: &TestHost<State<TestStateApi>>, id: AuctionId, slot_time: u64) -> AuctionView {
        let bytes = to_bytes(&id);
        let mut ctx = new_ctx(Address::Account(BOB), slot_time);
        ctx.set_parameter(&bytes);
        view_auction(&ctx, host).expect_report("Auction should exist")
    }

    fn call_as<'a>(sender: AccountAddress, bytes: &'a [u8]) -> TestReceiveContext<'a> {
        let mut ctx = new_ctx(Address::Account(sender), START);
        ctx.set_parameter(bytes);
        ctx
    }

    #[concordium_test]
    fn test_init() {
        let host = new_host();
        let state = host.state();

        claim_eq!(state.next_auction_id, 0);
        claim!(!state.config.paused);
        claim_eq!(state.config.default_reserve_price, ccd(100_000));
        claim!(state.authority.has_admin_rights(&Address::Account(ADMIN)));
    }

    #[concordium_test]
    fn test_init_zero_duration() {
        let params = InitParams {
            time_buffer: Duration::from_seconds(900),
            reserve_price: ccd(100_000),
            min_bid_increment: Percentage::from_percent(5),
            duration: Duration::from_millis(0),
            beneficiary: BENEFICIARY,
        };
        let bytes = to_bytes(&params);
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        claim!(init(&ctx, &mut state_builder).is_err());
    }

    #[concordium_test]
    fn test_create_auction() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let mut logger = TestLogger::init();

        let id = create(
            &mut host,
            CreateAuctionParams {
                token: token(1),
                reserve_price: None,
                start: None,
            },
            &mut logger,
        );
        claim_eq!(id, Ok(0));

        let created = view(&host, 0, START);
        claim_eq!(created.start_time, Timestamp::from_timestamp_millis(START));
        claim_eq!(created.end_time, Timestamp::from_timestamp_millis(END));
        claim_eq!(created.reserve_price, ccd(100_000));
        claim_eq!(created.amount, Amount::zero());
        claim_eq!(created.bidder, None);
        claim_eq!(created.phase, AuctionPhase::Active);

        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::created(
                0,
                &token(1),
                Timestamp::from_timestamp_millis(START),
                Timestamp::from_timestamp_millis(END),
                ccd(100_000),
            ))]
        );

        let id = create(
            &mut host,
            CreateAuctionParams {
                token: token(2),
                reserve_price: Some(ccd(5_000_000)),
                start: Some(Timestamp::from_timestamp_millis(START + SECOND)),
            },
            &mut logger,
        );
        claim_eq!(id, Ok(1));

        let scheduled = view(&host, 1, START);
        claim_eq!(scheduled.reserve_price, ccd(5_000_000));
        claim_eq!(scheduled.phase, AuctionPhase::Created);
    }

    #[concordium_test]
    fn test_create_auction_rejections() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let _ = create_default(&mut host);

        claim_eq!(
            create(
                &mut host,
                CreateAuctionParams {
                    token: token(1),
                    reserve_price: None,
                    start: None,
                },
                &mut TestLogger::init(),
            ),
            Err(CustomContractError::AuctionAlreadyExists)
        );

        let bytes = to_bytes(&CreateAuctionParams {
            token: token(2),
            reserve_price: None,
            start: None,
        });
        let mut ctx = new_ctx(Address::Account(ALICE), START);
        ctx.set_parameter(&bytes);
        claim_eq!(
            create_auction(&ctx, &mut host, &mut TestLogger::init()),
            Err(CustomContractError::Unauthorized)
        );

        setup_custody(&mut host, 0);
        claim_eq!(
            create(
                &mut host,
                CreateAuctionParams {
                    token: token(2),
                    reserve_price: None,
                    start: None,
                },
                &mut TestLogger::init(),
            ),
            Err(CustomContractError::AssetNotInCustody)
        );

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            reject_mock(),
        );
        claim_eq!(
            create(
                &mut host,
                CreateAuctionParams {
                    token: token(2),
                    reserve_price: None,
                    start: None,
                },
                &mut TestLogger::init(),
            ),
            Err(CustomContractError::AssetTransferFailed)
        );
        claim_eq!(host.state().next_auction_id, 1);
    }

    /// Bids and settlement with 0.1 CCD reserve and 5% increment:
    /// 1. Alice bids 0.2 CCD.
    /// 2. Bob bids 0.21 CCD, Alice gets 0.2 CCD back.
    /// 3. Alice bids 0.205 CCD and gets rejected.
    /// 4. Settlement before the end fails, after the end Bob gets the token
    ///    and the beneficiary gets 0.21 CCD.
    /// 5. Settling again fails.
    #[concordium_test]
    fn test_bid_and_settle() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, START + 1, &mut logger),
            Ok(())
        );
        claim!(host.get_transfers().is_empty());

        host.set_self_balance(ccd(410_000));
        claim_eq!(
            place_bid(&mut host, id, BOB, 210_000, START + 2, &mut logger),
            Ok(())
        );
        claim!(host.transfer_occurred(&ALICE, ccd(200_000)));

        claim_eq!(
            place_bid(&mut host, id, ALICE, 205_000, START + 3, &mut logger),
            Err(CustomContractError::BidTooLow)
        );

        let current = view(&host, id, START + 3);
        claim_eq!(current.amount, ccd(210_000));
        claim_eq!(current.bidder, Some(BOB));
        claim_eq!(current.end_time, Timestamp::from_timestamp_millis(END));

        claim_eq!(
            settle_at(&mut host, id, END - 1, &mut logger),
            Err(CustomContractError::AuctionNotEnded)
        );

        expect_token_transfer(&mut host, BOB);
        host.set_self_balance(ccd(210_000));
        claim_eq!(settle_at(&mut host, id, END, &mut logger), Ok(()));
        claim!(host.transfer_occurred(&BENEFICIARY, ccd(210_000)));

        let settled = view(&host, id, END);
        claim!(settled.settled);
        claim_eq!(settled.phase, AuctionPhase::Settled);
        claim_eq!(settled.bidder, Some(BOB));

        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&AuctionEvents::bid(id, &ALICE, ccd(200_000), false)),
                to_bytes(&AuctionEvents::bid(id, &BOB, ccd(210_000), false)),
                to_bytes(&AuctionEvents::settled(
                    id,
                    Some(BOB),
                    ccd(210_000),
                    &token(1)
                )),
            ]
        );

        claim_eq!(
            settle_at(&mut host, id, END + 1, &mut logger),
            Err(CustomContractError::AlreadySettled)
        );
        claim_eq!(
            place_bid(&mut host, id, ALICE, 500_000, END + 1, &mut logger),
            Err(CustomContractError::AuctionSettled)
        );
    }

    #[concordium_test]
    fn test_bid_rejections() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create(
            &mut host,
            CreateAuctionParams {
                token: token(1),
                reserve_price: None,
                start: Some(Timestamp::from_timestamp_millis(START + SECOND)),
            },
            &mut TestLogger::init(),
        )
        .expect_report("Auction creation should pass");
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, id + 1, ALICE, 200_000, START + SECOND, &mut logger),
            Err(CustomContractError::UnknownAuction)
        );
        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, START, &mut logger),
            Err(CustomContractError::AuctionNotStarted)
        );
        claim_eq!(
            place_bid(&mut host, id, ALICE, 99_999, START + SECOND, &mut logger),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, END + SECOND, &mut logger),
            Err(CustomContractError::AuctionEnded)
        );

        let bytes = to_bytes(&id);
        let mut ctx = new_ctx(Address::Contract(NFT_CONTRACT), START + SECOND);
        ctx.set_parameter(&bytes);
        claim_eq!(
            bid(&ctx, &mut host, ccd(200_000), &mut logger),
            Err(CustomContractError::OnlyAccountAddress)
        );

        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_late_bid_extends_auction() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let mut logger = TestLogger::init();

        let now = END - 100 * SECOND;
        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, now, &mut logger),
            Ok(())
        );

        let extended_end = Timestamp::from_timestamp_millis(now + 900 * SECOND);
        let current = view(&host, id, now);
        claim_eq!(current.end_time, extended_end);
        claim!(current.end_time.timestamp_millis() - END >= 800 * SECOND);

        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&AuctionEvents::bid(id, &ALICE, ccd(200_000), true)),
                to_bytes(&AuctionEvents::extended(id, extended_end)),
            ]
        );

        // Still open past the first end time
        host.set_self_balance(ccd(200_000));
        claim_eq!(
            place_bid(&mut host, id, BOB, 300_000, END + SECOND, &mut logger),
            Ok(())
        );
        claim_eq!(
            settle_at(&mut host, id, END + SECOND, &mut logger),
            Err(CustomContractError::AuctionNotEnded)
        );
    }

    #[concordium_test]
    fn test_failed_refund_keeps_auction() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, START + 1, &mut logger),
            Ok(())
        );

        host.set_self_balance(ccd(500_000));
        host.make_account_missing(ALICE);
        claim_eq!(
            place_bid(&mut host, id, BOB, 300_000, START + 2, &mut logger),
            Err(CustomContractError::RefundFailed)
        );

        let current = view(&host, id, START + 2);
        claim_eq!(current.amount, ccd(200_000));
        claim_eq!(current.bidder, Some(ALICE));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::bid(id, &ALICE, ccd(200_000), false))]
        );
    }

    #[concordium_test]
    fn test_pause_blocks_bids_not_settlement() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, START + 1, &mut logger),
            Ok(())
        );

        let ctx = new_ctx(Address::Account(ADMIN), START + 2);
        claim_eq!(pause(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(
            logger.logs.last().cloned(),
            Some(to_bytes(&AuctionEvents::Paused(Address::Account(ADMIN))))
        );

        claim_eq!(
            place_bid(&mut host, id, BOB, 300_000, START + 3, &mut logger),
            Err(CustomContractError::ContractPaused)
        );
        claim_eq!(
            create(
                &mut host,
                CreateAuctionParams {
                    token: token(2),
                    reserve_price: None,
                    start: None,
                },
                &mut logger,
            ),
            Err(CustomContractError::ContractPaused)
        );

        expect_token_transfer(&mut host, ALICE);
        host.set_self_balance(ccd(200_000));
        claim_eq!(settle_at(&mut host, id, END, &mut logger), Ok(()));
        claim!(host.transfer_occurred(&BENEFICIARY, ccd(200_000)));

        claim_eq!(unpause(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(
            logger.logs.last().cloned(),
            Some(to_bytes(&AuctionEvents::Unpaused(Address::Account(ADMIN))))
        );
        claim_eq!(
            create(
                &mut host,
                CreateAuctionParams {
                    token: token(1),
                    reserve_price: None,
                    start: None,
                },
                &mut logger,
            ),
            Ok(1)
        );
    }

    #[concordium_test]
    fn test_settle_without_bids() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let mut logger = TestLogger::init();

        claim_eq!(
            settle_at(&mut host, id + 1, END, &mut logger),
            Err(CustomContractError::UnknownAuction)
        );

        expect_token_transfer(&mut host, OWNER);
        claim_eq!(settle_at(&mut host, id, END, &mut logger), Ok(()));
        claim!(host.get_transfers().is_empty());

        let bytes = to_bytes(&NFT_CONTRACT);
        let mut ctx = new_ctx(Address::Account(BOB), END);
        ctx.set_parameter(&bytes);
        claim_eq!(
            view_twap(&ctx, &host),
            Ok(TwapView {
                twap: Some(Amount::zero()),
                samples: 1,
            })
        );
    }

    #[concordium_test]
    fn test_failed_token_transfer() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(),
        );
        claim_eq!(
            settle_at(&mut host, id, END, &mut TestLogger::init()),
            Err(CustomContractError::AssetTransferFailed)
        );
    }

    #[concordium_test]
    fn test_failed_payout() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        claim_eq!(
            place_bid(&mut host, id, ALICE, 200_000, START, &mut TestLogger::init()),
            Ok(())
        );

        expect_token_transfer(&mut host, ALICE);
        host.set_self_balance(ccd(200_000));
        host.make_account_missing(BENEFICIARY);

        let mut logger = TestLogger::init();
        claim_eq!(
            settle_at(&mut host, id, END, &mut logger),
            Err(CustomContractError::PayoutFailed)
        );
        claim!(logger.logs.is_empty(), "No settlement should be logged");
        claim!(!host.transfer_occurred(&BENEFICIARY, ccd(200_000)));
    }

    #[concordium_test]
    fn test_twap_after_settlements() {
        let mut host = new_host();
        setup_custody(&mut host, 1);
        let mut logger = TestLogger::init();

        let first = create_default(&mut host);
        claim_eq!(
            place_bid(&mut host, first, ALICE, 100_000, START, &mut logger),
            Ok(())
        );
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParameter, _>(()),
        );
        host.set_self_balance(ccd(100_000));
        claim_eq!(settle_at(&mut host, first, END, &mut logger), Ok(()));

        // Second auction starts right away and runs three days
        let bytes = to_bytes(&InternalValue::Duration(Duration::from_millis(3 * DURATION)));
        let mut ctx = new_ctx(Address::Account(ADMIN), END);
        ctx.set_parameter(&bytes);
        claim_eq!(update_internal_value(&ctx, &mut host, &mut logger), Ok(()));

        let second = create(
            &mut host,
            CreateAuctionParams {
                token: token(1),
                reserve_price: None,
                start: Some(Timestamp::from_timestamp_millis(END)),
            },
            &mut logger,
        )
        .expect_report("Auction creation should pass");
        claim_eq!(
            place_bid(&mut host, second, BOB, 400_000, END, &mut logger),
            Ok(())
        );
        host.set_self_balance(ccd(400_000));
        claim_eq!(
            settle_at(&mut host, second, END + 3 * DURATION, &mut logger),
            Ok(())
        );

        let bytes = to_bytes(&NFT_CONTRACT);
        let mut ctx = new_ctx(Address::Account(BOB), END + 3 * DURATION);
        ctx.set_parameter(&bytes);
        claim_eq!(
            view_twap(&ctx, &host),
            // 0.1 CCD was the latest price for three days, 0.4 CCD comes from a three day auction
            Ok(TwapView {
                twap: Some(ccd(250_000)),
                samples: 2,
            })
        );
    }

    #[concordium_test]
    fn test_admin_only_configuration() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let bytes = to_bytes(&Duration::from_seconds(60));
        claim_eq!(
            set_time_buffer(&call_as(ALICE, &bytes), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            set_time_buffer(&call_as(ADMIN, &bytes), &mut host, &mut logger),
            Ok(())
        );

        let bytes = to_bytes(&ccd(1_000_000));
        claim_eq!(
            set_default_reserve_price(&call_as(ALICE, &bytes), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            set_default_reserve_price(&call_as(ADMIN, &bytes), &mut host, &mut logger),
            Ok(())
        );

        let bytes = to_bytes(&InternalValue::Beneficiary(ALICE));
        claim_eq!(
            update_internal_value(&call_as(ALICE, &bytes), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            pause(&call_as(ALICE, &[]), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            unpause(&call_as(ALICE, &[]), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        let config = view_config(&call_as(ALICE, &[]), &host)
            .expect_report("Config should be viewable");
        claim_eq!(config.time_buffer, Duration::from_seconds(60));
        claim_eq!(config.default_reserve_price, ccd(1_000_000));
        claim_eq!(config.beneficiary, BENEFICIARY);
        claim!(!config.paused);

        let state = &host.state().config;
        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&AuctionEvents::ConfigUpdated(&HouseConfig {
                    default_reserve_price: ccd(100_000),
                    ..state.clone()
                })),
                to_bytes(&AuctionEvents::ConfigUpdated(state)),
            ]
        );

        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        claim_eq!(view(&host, id, START).reserve_price, ccd(1_000_000));
    }

    #[concordium_test]
    fn test_overflowing_time_buffer() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let bytes = to_bytes(&Duration::from_millis(u64::MAX));
        claim_eq!(
            set_time_buffer(&call_as(ADMIN, &bytes), &mut host, &mut logger),
            Err(CustomContractError::InvalidDuration)
        );
        claim_eq!(
            host.state().config.time_buffer,
            Duration::from_seconds(900)
        );
        claim!(logger.logs.is_empty());

        // Late bids still extend the auction with the kept buffer
        setup_custody(&mut host, 1);
        let id = create_default(&mut host);
        let late = END - 60 * SECOND;
        claim_eq!(
            place_bid(&mut host, id, ALICE, 100_000, late, &mut logger),
            Ok(())
        );
        claim_eq!(
            view(&host, id, late).end_time,
            Timestamp::from_timestamp_millis(late + 900 * SECOND)
        );
    }

    #[concordium_test]
    fn test_internal_values() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        for value in vec![
            InternalValue::MinBidIncrement(Percentage::from_percent(10)),
            InternalValue::Duration(Duration::from_seconds(3_600)),
            InternalValue::Beneficiary(BOB),
        ] {
            let bytes = to_bytes(&value);
            claim_eq!(
                update_internal_value(&call_as(ADMIN, &bytes), &mut host, &mut logger),
                Ok(())
            );
        }
        claim_eq!(logger.logs.len(), 3);

        let bytes = to_bytes(&InternalValue::Duration(Duration::from_millis(0)));
        claim_eq!(
            update_internal_value(&call_as(ADMIN, &bytes), &mut host, &mut logger),
            Err(CustomContractError::InvalidDuration)
        );

        for (params, expected) in vec![
            (
                ViewInternalValueParams::MinBidIncrement,
                InternalValue::MinBidIncrement(Percentage::from_percent(10)),
            ),
            (
                ViewInternalValueParams::Duration,
                InternalValue::Duration(Duration::from_seconds(3_600)),
            ),
            (
                ViewInternalValueParams::Beneficiary,
                InternalValue::Beneficiary(BOB),
            ),
        ] {
            let bytes = to_bytes(&params);
            claim_eq!(
                view_internal_value(&call_as(ALICE, &bytes), &host),
                Ok(expected)
            );
        }
    }

    #[concordium_test]
    fn test_new_admin_gets_capability() {
        let mut host = new_host();

        let bytes = to_bytes(&AuthorityUpdateParams {
            field: AuthorityField::Admin,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(ALICE),
        });
        let mut ctx = new_ctx(Address::Account(ADMIN), START);
        ctx.set_parameter(&bytes);
        claim_eq!(update_authority(&ctx, &mut host), Ok(()));

        claim_eq!(
            pause(&call_as(ALICE, &[]), &mut host, &mut TestLogger::init()),
            Ok(())
        );
        claim!(host.state().config.paused);

        let bytes = to_bytes(&AuthorityViewParams {
            field: AuthorityField::Admin,
            skip: 0,
            show: 10,
        });
        let mut ctx = new_ctx(Address::Account(BOB), START);
        ctx.set_parameter(&bytes);
        let admins = view_authority(&ctx, &host).expect_report("Admins should be viewable");
        claim_eq!(admins.len(), 2);
        claim!(admins.contains(&Address::Account(ALICE)));
    }

    #[concordium_test]
    fn test_maintainer_has_no_admin_rights() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let bytes = to_bytes(&AuthorityUpdateParams {
            field: AuthorityField::Maintainer,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(ALICE),
        });
        claim_eq!(update_authority(&call_as(ADMIN, &bytes), &mut host), Ok(()));

        let bytes = to_bytes(&AuthorityUpdateParams {
            field: AuthorityField::Maintainer,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(BOB),
        });
        claim_eq!(update_authority(&call_as(ALICE, &bytes), &mut host), Ok(()));
        claim!(host
            .state()
            .authority
            .has_maintainer_rights(&Address::Account(BOB)));

        let bytes = to_bytes(&AuthorityUpdateParams {
            field: AuthorityField::Admin,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(BOB),
        });
        claim_eq!(
            update_authority(&call_as(ALICE, &bytes), &mut host),
            Err(CustomContractError::Unauthorized)
        );

        claim_eq!(
            pause(&call_as(ALICE, &[]), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        let bytes = to_bytes(&Duration::from_seconds(60));
        claim_eq!(
            set_time_buffer(&call_as(ALICE, &bytes), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );

        setup_custody(&mut host, 1);
        let bytes = to_bytes(&CreateAuctionParams {
            token: token(1),
            reserve_price: None,
            start: None,
        });
        claim_eq!(
            create_auction(&call_as(ALICE, &bytes), &mut host, &mut logger),
            Err(CustomContractError::Unauthorized)
        );
        claim!(logger.logs.is_empty());
        claim!(!host.state().config.paused);
    }
}
