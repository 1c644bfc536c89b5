use super::*;

use core::convert::TryInto;
use core::ops::Add;

/// Percentage with micro-percent resolution: `from_percent(1)` is 1_000_000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct Percentage(u64);

impl Percentage {
    pub fn from_micro_percent(micro_percent: u64) -> Self {
        Self(micro_percent)
    }

    pub fn from_percent(percent: u64) -> Self {
        Self(percent * 1_000_000)
    }

    /// Ratio of `amount` to `of`, rounded down. Saturates on division by zero.
    pub fn of_amount(amount: Amount, of: Amount) -> Percentage {
        Percentage(
            (amount.micro_ccd as u128 * 100_000_000)
                .checked_div(of.micro_ccd as u128)
                .and_then(|res| res.try_into().ok())
                .unwrap_or(u64::MAX),
        )
    }
}

impl Add for Percentage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Percentage(self.0.saturating_add(rhs.0))
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_increment_threshold() {
        claim_eq!(
            Percentage::from_percent(100) + Percentage::from_micro_percent(500_000),
            Percentage::from_micro_percent(100_500_000)
        );
        claim_eq!(
            Percentage::from_micro_percent(u64::MAX) + Percentage::from_percent(1),
            Percentage::from_micro_percent(u64::MAX)
        );
    }

    #[concordium_test]
    fn test_of_amount() {
        let previous = Amount::from_micro_ccd(200_000);

        claim_eq!(
            Percentage::of_amount(Amount::from_micro_ccd(210_000), previous),
            Percentage::from_percent(105)
        );
        claim!(
            Percentage::of_amount(Amount::from_micro_ccd(209_999), previous)
                < Percentage::from_percent(105)
        );
        claim_eq!(
            Percentage::of_amount(Amount::from_micro_ccd(1), Amount::zero()),
            Percentage::from_micro_percent(u64::MAX)
        );
    }
}
