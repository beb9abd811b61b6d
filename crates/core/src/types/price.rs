//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are never floats: `199.99 + 2 × 159.99` must be exactly `519.97`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input could not be parsed as a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative amount in the store currency.
///
/// The storefront sells in a single currency (USD), so a price is just a
/// validated decimal. Serialized as a decimal string (`"199.99"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Parse a price from a string such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] for non-numeric input and
    /// [`PriceError::Negative`] for negative amounts.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display with two decimals (e.g. `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
