//! Money type stored as integer minor currency units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `i64` minor units (e.g. cents); fractional factors such as
//! commission rates are `rust_decimal::Decimal` and results are rounded back
//! to whole minor units.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount in minor currency units.
///
/// The marketplace runs in a single currency, so no currency code travels
/// with the amount. Negative values are legal and represent offsets
/// (e.g. reversal entries).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction, `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Returns the smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Multiplies by a decimal factor and rounds half away from zero to
    /// whole minor units.
    ///
    /// Returns `None` if the result does not fit in `i64`.
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Option<Self> {
        (Decimal::from(self.0) * factor)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Price for `minutes` of a lesson charged at `self` per hour.
    ///
    /// Returns `None` if the result does not fit in `i64`.
    #[must_use]
    pub fn prorate_hourly(self, minutes: u32) -> Option<Self> {
        (Decimal::from(self.0) * Decimal::from(minutes) / Decimal::from(60))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_zero() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(50_000);
        let b = Money::from_minor(7_500);
        assert_eq!(a - b, Money::from_minor(42_500));
        assert_eq!(a + b, Money::from_minor(57_500));
        assert_eq!(-b, Money::from_minor(-7_500));
        assert_eq!([a, b].iter().sum::<Money>(), Money::from_minor(57_500));
    }

    #[test]
    fn test_checked_overflow() {
        assert!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)).is_none());
        assert!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)).is_none());
    }

    #[rstest]
    #[case(50_000, dec!(0.15), 7_500)]
    #[case(33_333, dec!(0.15), 5_000)]
    #[case(10_001, dec!(0.15), 1_500)]
    #[case(5, dec!(0.5), 3)]
    #[case(-5, dec!(0.5), -3)]
    #[case(12_345, dec!(0), 0)]
    fn test_scale_rounds_half_away_from_zero(
        #[case] minor: i64,
        #[case] rate: Decimal,
        #[case] expected: i64,
    ) {
        assert_eq!(
            Money::from_minor(minor).scale(rate),
            Some(Money::from_minor(expected))
        );
    }

    #[rstest]
    #[case(50_000, 60, 50_000)]
    #[case(50_000, 30, 25_000)]
    #[case(50_000, 45, 37_500)]
    #[case(50_000, 90, 75_000)]
    #[case(10_000, 50, 8_333)]
    #[case(10_001, 30, 5_001)]
    fn test_prorate_hourly(#[case] per_hour: i64, #[case] minutes: u32, #[case] expected: i64) {
        assert_eq!(
            Money::from_minor(per_hour).prorate_hourly(minutes),
            Some(Money::from_minor(expected))
        );
    }

    #[test]
    fn test_money_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_minor(42_500)).unwrap();
        assert_eq!(json, "42500");
        let back: Money = serde_json::from_str("42500").unwrap();
        assert_eq!(back, Money::from_minor(42_500));
    }
}
