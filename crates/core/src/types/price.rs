//! Type-safe price representation using decimal arithmetic.
//!
//! Menu prices arrive from the backend as JSON numbers. They are converted to
//! [`Decimal`] once, at the boundary, so cart totals never accumulate binary
//! floating-point error (`0.1 + 0.2` stays `0.3`).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(String),
    /// The amount is NaN or infinite.
    #[error("price must be a finite number")]
    NotFinite,
    /// The input is not a decimal number.
    #[error("invalid price {0:?}")]
    Invalid(String),
}

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount.to_string()));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Convert a floating-point amount as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or is negative.
    pub fn from_f64(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NotFinite);
        }
        let decimal =
            Decimal::try_from(amount).map_err(|_| PriceError::Invalid(amount.to_string()))?;
        Self::new(decimal)
    }

    /// Parse a price from text such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a decimal number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let decimal: Decimal = s
            .trim()
            .parse()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(decimal)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true for a zero price.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at [`Decimal::MAX`].
    fn add(self, rhs: Self) -> Self {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// Prices are accepted both as numbers (`5.5`) and as strings (`"5.50"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PriceRepr::deserialize(deserializer)? {
            PriceRepr::Number(n) => Self::from_f64(n),
            PriceRepr::Text(s) => Self::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::from_cents(-1),
            Err(PriceError::Negative(_))
        ));
        assert!(matches!(Price::parse("-0.01"), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(5.99).unwrap(), price("5.99"));
        assert_eq!(Price::from_f64(f64::NAN), Err(PriceError::NotFinite));
        assert_eq!(Price::from_f64(f64::INFINITY), Err(PriceError::NotFinite));
    }

    #[test]
    fn test_decimal_addition_is_exact() {
        let total = Price::from_f64(0.1).unwrap() + Price::from_f64(0.2).unwrap();
        assert_eq!(total, price("0.3"));
    }

    #[test]
    fn test_times_and_sum() {
        let prices = [price("5"), price("1"), price("2")];
        let unit: Price = prices.iter().sum();
        assert_eq!(unit * 2, price("16"));
        assert_eq!(Price::ZERO.times(7), Price::ZERO);
    }

    #[test]
    fn test_overflow_saturates() {
        let huge = Price::new(Decimal::MAX).unwrap();
        assert_eq!(huge.times(u32::MAX).amount(), Decimal::MAX);
        assert_eq!((huge + price("1")).amount(), Decimal::MAX);

        let mut total = huge;
        total += huge;
        assert_eq!(total.amount(), Decimal::MAX);
        assert_eq!([huge, huge].iter().sum::<Price>().amount(), Decimal::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(price("12.5").to_string(), "$12.50");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let from_number: Price = serde_json::from_str("4.25").unwrap();
        let from_text: Price = serde_json::from_str("\"4.25\"").unwrap();
        assert_eq!(from_number, from_text);
        assert!(serde_json::from_str::<Price>("-3").is_err());
        assert!(serde_json::from_str::<Price>("\"abc\"").is_err());
    }

    #[test]
    fn test_serialize_as_string() {
        assert_eq!(serde_json::to_string(&price("3.50")).unwrap(), "\"3.5\"");
    }
}
