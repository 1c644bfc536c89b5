use commons::{AdminCap, ContractResult, CustomContractError, Percentage};
use concordium_std::*;

use crate::external::InitParams;

/// Auction house settings. Mutating any of them requires the [AdminCap].
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct HouseConfig {
    /// Minimum time left for counter-bids after any accepted bid.
    pub time_buffer: Duration,
    /// Reserve price for auctions created without an explicit one.
    pub default_reserve_price: Amount,
    /// Required raise of a new bid over the current highest one.
    pub min_bid_increment: Percentage,
    /// Length of newly created auctions.
    pub duration: Duration,
    /// Account receiving the winning bids.
    pub beneficiary: AccountAddress,
    /// While set, bidding and auction creation are rejected.
    pub paused: bool,
}

impl HouseConfig {
    pub fn new(params: InitParams) -> Self {
        Self {
            time_buffer: params.time_buffer,
            default_reserve_price: params.reserve_price,
            min_bid_increment: params.min_bid_increment,
            duration: params.duration,
            beneficiary: params.beneficiary,
            paused: false,
        }
    }

    /// Rejects buffers that can not be added to `now`, those would fail every late bid.
    pub fn set_time_buffer(
        &mut self,
        _cap: &AdminCap,
        time_buffer: Duration,
        now: Timestamp,
    ) -> ContractResult<()> {
        ensure!(
            now.checked_add(time_buffer).is_some(),
            CustomContractError::InvalidDuration
        );
        self.time_buffer = time_buffer;
        Ok(())
    }

    pub fn set_default_reserve_price(&mut self, _cap: &AdminCap, reserve_price: Amount) {
        self.default_reserve_price = reserve_price;
    }

    pub fn set_min_bid_increment(&mut self, _cap: &AdminCap, increment: Percentage) {
        self.min_bid_increment = increment;
    }

    pub fn set_duration(&mut self, _cap: &AdminCap, duration: Duration) {
        self.duration = duration;
    }

    pub fn set_beneficiary(&mut self, _cap: &AdminCap, beneficiary: AccountAddress) {
        self.beneficiary = beneficiary;
    }

    /// Returns `false` if the house was already paused.
    pub fn pause(&mut self, _cap: &AdminCap) -> bool {
        !core::mem::replace(&mut self.paused, true)
    }

    /// Returns `false` if the house was not paused.
    pub fn unpause(&mut self, _cap: &AdminCap) -> bool {
        core::mem::replace(&mut self.paused, false)
    }

    /// Reserve price of a new auction, falling back to the default on `None` or zero.
    pub fn reserve_price_or_default(&self, reserve_price: Option<Amount>) -> Amount {
        match reserve_price {
            Some(price) if price > Amount::zero() => price,
            _ => self.default_reserve_price,
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::Authority;
    use test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);

    fn now() -> Timestamp {
        Timestamp::from_timestamp_millis(1_000_000)
    }

    fn default_config() -> HouseConfig {
        HouseConfig::new(InitParams {
            time_buffer: Duration::from_seconds(900),
            reserve_price: Amount::from_micro_ccd(100_000),
            min_bid_increment: Percentage::from_percent(5),
            duration: Duration::from_seconds(86_400),
            beneficiary: ADMIN,
        })
    }

    #[concordium_test]
    fn test_setters_with_capability() {
        let mut state_builder = TestStateBuilder::new();
        let authority = Authority::new(&mut state_builder, Address::Account(ADMIN));
        let cap = authority
            .admin_cap(&Address::Account(ADMIN))
            .expect_report("Admin should hold the capability");

        let mut config = default_config();
        config
            .set_time_buffer(&cap, Duration::from_seconds(1_800), now())
            .expect_report("Buffer should be accepted");
        config.set_default_reserve_price(&cap, Amount::from_micro_ccd(200_000));
        config.set_min_bid_increment(&cap, Percentage::from_percent(10));
        config.set_duration(&cap, Duration::from_seconds(3_600));

        claim_eq!(config.time_buffer, Duration::from_seconds(1_800));
        claim_eq!(config.default_reserve_price, Amount::from_micro_ccd(200_000));
        claim_eq!(config.min_bid_increment, Percentage::from_percent(10));
        claim_eq!(config.duration, Duration::from_seconds(3_600));
    }

    #[concordium_test]
    fn test_overflowing_time_buffer_rejected() {
        let mut state_builder = TestStateBuilder::new();
        let authority = Authority::new(&mut state_builder, Address::Account(ADMIN));
        let cap = authority
            .admin_cap(&Address::Account(ADMIN))
            .expect_report("Admin should hold the capability");

        let mut config = default_config();
        claim_eq!(
            config.set_time_buffer(&cap, Duration::from_millis(u64::MAX), now()),
            Err(CustomContractError::InvalidDuration)
        );
        claim_eq!(config.time_buffer, Duration::from_seconds(900));

        let largest = Duration::from_millis(u64::MAX - now().timestamp_millis());
        claim_eq!(config.set_time_buffer(&cap, largest, now()), Ok(()));
        claim_eq!(config.time_buffer, largest);
    }

    #[concordium_test]
    fn test_pause_toggle() {
        let mut state_builder = TestStateBuilder::new();
        let authority = Authority::new(&mut state_builder, Address::Account(ADMIN));
        let cap = authority
            .admin_cap(&Address::Account(ADMIN))
            .expect_report("Admin should hold the capability");

        let mut config = default_config();
        claim!(config.pause(&cap));
        claim!(config.paused);
        claim!(!config.pause(&cap), "Pausing twice is a no-op");
        claim!(config.unpause(&cap));
        claim!(!config.paused);
        claim!(!config.unpause(&cap));
    }

    #[concordium_test]
    fn test_reserve_price_fallback() {
        let config = default_config();

        claim_eq!(
            config.reserve_price_or_default(None),
            Amount::from_micro_ccd(100_000)
        );
        claim_eq!(
            config.reserve_price_or_default(Some(Amount::zero())),
            Amount::from_micro_ccd(100_000)
        );
        claim_eq!(
            config.reserve_price_or_default(Some(Amount::from_micro_ccd(5))),
            Amount::from_micro_ccd(5)
        );
    }
}
