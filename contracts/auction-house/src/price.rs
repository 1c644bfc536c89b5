//! Time weighted average settlement price per asset class.
//!
//! Each settlement contributes one sample. A sample is weighted by the time
//! its price was the latest known price of the class, from its settlement
//! until the next settlement of the class. The newest sample has no successor
//! yet, so it is weighted by the length of its own auction until the next
//! settlement replaces that weight. Only the newest [TWAP_WINDOW] samples
//! are kept.
use commons::TWAP_WINDOW;
use concordium_std::*;

#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct PriceSample {
    /// Final auction amount, zero for auctions without bids.
    pub price: Amount,
    /// Time the price stayed the latest one, in milliseconds and at least 1.
    /// Provisional for the newest sample.
    pub weight_ms: u64,
    /// Settlement time.
    pub settled_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq, Default)]
pub struct PriceHistory {
    /// Oldest first.
    samples: Vec<PriceSample>,
}

impl PriceHistory {
    /// Record a settlement price. The previous price is closed at `settled_at`,
    /// the new one is weighted by `auction_length` until it gets closed itself.
    pub fn record(&mut self, price: Amount, settled_at: Timestamp, auction_length: Duration) {
        if let Some(last) = self.samples.last_mut() {
            last.weight_ms = settled_at
                .timestamp_millis()
                .saturating_sub(last.settled_at.timestamp_millis())
                .max(1);
        }

        if self.samples.len() >= TWAP_WINDOW {
            self.samples.remove(0);
        }
        self.samples.push(PriceSample {
            price,
            weight_ms: auction_length.millis().max(1),
            settled_at,
        });
    }

    pub fn twap(&self) -> Option<Amount> {
        let (weighted, total_weight) =
            self.samples
                .iter()
                .fold((0u128, 0u128), |(weighted, total), sample| {
                    (
                        weighted + sample.price.micro_ccd as u128 * sample.weight_ms as u128,
                        total + sample.weight_ms as u128,
                    )
                });

        if total_weight == 0 {
            return None;
        }

        // Average of u64 prices always fits back into u64
        Some(Amount::from_micro_ccd((weighted / total_weight) as u64))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const DAY_MS: u64 = 86_400_000;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    #[concordium_test]
    fn test_empty_history_has_no_twap() {
        let history = PriceHistory::default();
        claim!(history.is_empty());
        claim_eq!(history.twap(), None);
    }

    #[concordium_test]
    fn test_single_sample_twap_is_price() {
        let mut history = PriceHistory::default();
        history.record(
            Amount::from_micro_ccd(200_000),
            at(DAY_MS),
            Duration::from_millis(DAY_MS),
        );

        claim_eq!(history.twap(), Some(Amount::from_micro_ccd(200_000)));
    }

    #[concordium_test]
    fn test_samples_weighted_by_time() {
        let mut history = PriceHistory::default();
        // 100 stays the latest price from day 1 to day 4, 400 is fresh from a one day auction
        history.record(Amount::from_micro_ccd(100), at(DAY_MS), Duration::from_millis(DAY_MS));
        history.record(Amount::from_micro_ccd(400), at(4 * DAY_MS), Duration::from_millis(DAY_MS));

        claim_eq!(history.twap(), Some(Amount::from_micro_ccd(175)));
    }

    #[concordium_test]
    fn test_newest_sample_weight_is_replaced() {
        let mut history = PriceHistory::default();
        history.record(Amount::from_micro_ccd(100), at(DAY_MS), Duration::from_millis(DAY_MS));
        history.record(Amount::from_micro_ccd(400), at(4 * DAY_MS), Duration::from_millis(DAY_MS));
        // 400 turns out to hold for one day only, 100 from a 7 day auction is fresh
        history.record(Amount::from_micro_ccd(100), at(5 * DAY_MS), Duration::from_millis(7 * DAY_MS));

        // (100 * 3 + 400 * 1 + 100 * 7) / 11
        claim_eq!(history.twap(), Some(Amount::from_micro_ccd(127)));
        claim_eq!(history.len(), 3);
    }

    #[concordium_test]
    fn test_zero_elapsed_still_counts() {
        let mut history = PriceHistory::default();
        history.record(Amount::from_micro_ccd(100), at(10), Duration::from_millis(0));
        history.record(Amount::from_micro_ccd(300), at(10), Duration::from_millis(0));

        claim_eq!(history.twap(), Some(Amount::from_micro_ccd(200)));
    }

    #[concordium_test]
    fn test_window_drops_oldest() {
        let mut history = PriceHistory::default();
        history.record(
            Amount::from_micro_ccd(1_000_000),
            at(DAY_MS),
            Duration::from_millis(DAY_MS),
        );
        for day in 2..=(TWAP_WINDOW as u64 + 1) {
            history.record(
                Amount::from_micro_ccd(10),
                at(day * DAY_MS),
                Duration::from_millis(DAY_MS),
            );
        }

        claim_eq!(history.len(), TWAP_WINDOW);
        claim_eq!(history.twap(), Some(Amount::from_micro_ccd(10)));
    }
}
