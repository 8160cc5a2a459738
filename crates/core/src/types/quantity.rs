//! Non-negative item quantity.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is not a whole number.
    #[error("quantity is not a whole number: {0}")]
    Invalid(String),
    /// The number is below zero.
    #[error("quantity cannot be negative")]
    Negative,
    /// The number does not fit the storage column.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Largest storable quantity.
        max: u32,
    },
}

/// How many units of an item are on a list.
///
/// Stored as a Postgres `INTEGER`, so values are capped at `i32::MAX`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest storable quantity.
    #[allow(clippy::cast_sign_loss)] // i32::MAX is positive
    pub const MAX: u32 = i32::MAX as u32;

    /// One unit; the default for free-form items.
    pub const ONE: Self = Self(1);

    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Create a quantity, saturating at [`Quantity::MAX`].
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Parse a quantity from user input such as `"3"` or `" 12 "`.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Invalid` for non-integers, `QuantityError::Negative`
    /// for values below zero and `QuantityError::TooLarge` above [`Quantity::MAX`].
    pub fn parse(s: &str) -> Result<Self, QuantityError> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| QuantityError::Invalid(s.to_owned()))?;
        if value < 0 {
            return Err(QuantityError::Negative);
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns true for zero units.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        let value = u32::try_from(raw).map_err(|_| QuantityError::Negative)?;
        Ok(Self(value))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let value = i32::try_from(self.0)?;
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&value, buf)
    }
}
