//! Non-negative unit price using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Quantity;

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price is not a number: {0}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit the storage column.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Largest storable price.
        max: Decimal,
    },
}

/// A non-negative unit price with two fractional digits.
///
/// Amounts are rounded half away from zero to cents on construction, so
/// `1.505` becomes `1.51`. Arithmetic on prices never goes through floating
/// point.
///
/// ```
/// use basket_core::{Price, Quantity};
///
/// let price = Price::parse("1.50").unwrap();
/// assert_eq!(price.line_total(Quantity::new(3)).to_string(), "4.50");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of fractional digits kept.
    pub const SCALE: u32 = 2;

    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Largest whole-cent amount a `NUMERIC(10, 2)` column holds.
    const MAX_CENTS: i64 = 9_999_999_999;

    /// Create a price from an amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero and
    /// `PriceError::TooLarge` if it exceeds [`Price::max`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let mut rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::max() {
            return Err(PriceError::TooLarge { max: Self::max() });
        }
        rounded.rescale(Self::SCALE);
        // -0.00 would otherwise render with a sign
        rounded.set_sign_positive(true);
        Ok(Self(rounded))
    }

    /// Largest storable price.
    #[must_use]
    pub fn max() -> Decimal {
        Decimal::new(Self::MAX_CENTS, Self::SCALE)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), Self::SCALE))
    }

    /// Parse a price from user input such as `"1.50"` or `" 2 "`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` if the input is not a decimal number,
    /// `PriceError::Negative` if it is below zero and `PriceError::TooLarge`
    /// above [`Price::max`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// Returns the amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `quantity × price`.
    #[must_use]
    pub fn line_total(&self, quantity: Quantity) -> Decimal {
        let mut total = self.0 * Decimal::from(quantity.get());
        // A zero factor yields a scale-0 zero
        total.rescale(Self::SCALE);
        total
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
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

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("1.50").unwrap().to_string(), "1.50");
        assert_eq!(Price::parse("2").unwrap().to_string(), "2.00");
        assert_eq!(Price::parse(" 0.99 ").unwrap().to_string(), "0.99");
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        assert_eq!(Price::parse("1.505").unwrap().to_string(), "1.51");
        assert_eq!(Price::parse("1.504").unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert!(matches!(Price::parse(""), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(Price::parse("-0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_too_large() {
        assert!(Price::parse("99999999.99").is_ok());
        assert!(matches!(
            Price::parse("100000000"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(150).to_string(), "1.50");
    }

    #[test]
    fn test_line_total() {
        let price = Price::parse("1.50").unwrap();
        assert_eq!(price.line_total(Quantity::new(3)), Decimal::new(450, 2));
        assert_eq!(price.line_total(Quantity::new(0)), Decimal::ZERO);
    }

    #[test]
    fn test_zero_keeps_two_places() {
        assert_eq!(serde_json::to_string(&Price::ZERO).unwrap(), "\"0.00\"");
        assert_eq!(Price::default(), Price::ZERO);
    }

    #[test]
    fn test_serde_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.00\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Price::from_cents(199)).unwrap();
        assert_eq!(json, "\"1.99\"");
    }
}
