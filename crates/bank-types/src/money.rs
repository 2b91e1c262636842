use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An exact decimal monetary amount.
///
/// Backed by [`Decimal`], so chains of deposits, withdrawals and transfers
/// never accumulate binary rounding drift. There is a single implied currency.
/// Serialized as a string to keep the exact representation on the wire.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Decimal places used when rendering for display.
    pub const DISPLAY_SCALE: u32 = 2;

    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Build from an integer count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition. `None` on decimal overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction. `None` on decimal overflow; the result may be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Round half-away-from-zero to [`Self::DISPLAY_SCALE`] places.
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(Self::DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Money {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str_exact(trimmed)
            .map(Self)
            .map_err(|_| TypeError::InvalidMoney(trimmed.to_string()))
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Money({})", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.rounded().0;
        rounded.rescale(Self::DISPLAY_SCALE);
        write!(f, "{rounded}")
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|m| m.0).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_exact_decimal() {
        let m: Money = "100.05".parse().unwrap();
        assert_eq!(m.amount(), dec!(100.05));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "ten".parse::<Money>().unwrap_err();
        assert_eq!(err, TypeError::InvalidMoney("ten".into()));
    }

    #[test]
    fn display_pads_to_two_places() {
        assert_eq!(Money::new(dec!(100)).to_string(), "100.00");
        assert_eq!(Money::new(dec!(0.5)).to_string(), "0.50");
        assert_eq!(Money::new(dec!(2.345)).to_string(), "2.35");
    }

    #[test]
    fn positivity() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(Money::new(dec!(-1)).is_negative());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn from_cents() {
        assert_eq!(Money::from_cents(12_345), Money::new(dec!(123.45)));
    }

    #[test]
    fn no_float_drift_over_many_additions() {
        let tenth = Money::new(dec!(0.1));
        let total: Money = std::iter::repeat(tenth).take(10).sum();
        assert_eq!(total, Money::new(dec!(1.0)));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Money::new(dec!(12.30))).unwrap();
        assert_eq!(json, "\"12.30\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount(), dec!(12.30));
    }

    proptest! {
        #[test]
        fn add_then_sub_is_identity(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000) {
            let x = Money::from_cents(a);
            let y = Money::from_cents(b);
            let back = x.checked_add(y).unwrap().checked_sub(y).unwrap();
            prop_assert_eq!(back, x);
        }
    }
}
