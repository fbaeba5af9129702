//! Rupee amounts with precise decimal arithmetic
//!
//! Every monetary column in the billing tables is an INR amount stored as
//! `NUMERIC(14,2)`. This module wraps `rust_decimal::Decimal` so collection
//! totals and invoice ceilings are compared exactly, never through floats.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Number of decimal places for rupee amounts (paise)
pub const RUPEE_DECIMAL_PLACES: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// An amount in Indian rupees
///
/// Amounts keep the scale they were created with so that `10000` and
/// `10000.00` compare equal but are never silently rounded. Use
/// [`Money::round_to_paise`] when a stored representation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new rupee amount
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates Money from an integer amount of paise
    pub fn from_minor(paise: i64) -> Self {
        Self(Decimal::new(paise, RUPEE_DECIMAL_PLACES))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Treats a missing column value as zero
    pub fn from_optional(amount: Option<Decimal>) -> Self {
        Self(amount.unwrap_or_default())
    }

    /// Parses an amount entered as text, e.g. `"10000.00"`
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        trimmed
            .parse::<Decimal>()
            .map(Self)
            .map_err(|_| MoneyError::InvalidAmount(trimmed.to_string()))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to whole paise using banker's rounding
    pub fn round_to_paise(&self) -> Self {
        Self(self.0.round_dp_with_strategy(
            RUPEE_DECIMAL_PLACES,
            rust_decimal::RoundingStrategy::MidpointNearestEven,
        ))
    }

    /// Checked addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Sums a sequence of amounts, failing on overflow
    pub fn checked_sum<'a, I>(amounts: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Decimal {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "₹{:.dp$}",
            self.0,
            dp = RUPEE_DECIMAL_PLACES as usize
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn checked_sum_matches_operator_sum(
            values in proptest::collection::vec(-1_000_000_000i64..1_000_000_000i64, 0..10)
        ) {
            let amounts: Vec<Money> = values.iter().map(|v| Money::from_minor(*v)).collect();
            let checked = Money::checked_sum(&amounts).unwrap();
            let summed: Money = amounts.iter().copied().sum();
            prop_assert_eq!(checked, summed);
        }

        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            let mc = Money::from_minor(c);

            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }
    }
}
