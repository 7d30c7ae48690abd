//! Type-safe price representation using decimal arithmetic.
//!
//! Game prices are stored as `NUMERIC(10, 2)` and always carry two decimal
//! places. Prices are in the store currency (USD); there is no multi-currency
//! support.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in `NUMERIC(10, 2)`.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative price with two decimal places.
///
/// ## Examples
///
/// ```
/// use pixel_vault_core::Price;
///
/// let price = Price::parse("9.99").unwrap();
/// assert_eq!(price.to_string(), "$9.99");
///
/// // Leading currency symbols from form input are accepted
/// assert_eq!(Price::parse("$59.9").unwrap().to_string(), "$59.90");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("free").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Exclusive upper bound imposed by `NUMERIC(10, 2)`.
    pub const MAX: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Create a price from a decimal amount, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or too large.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        let mut rounded = amount.round_dp(2);
        rounded.rescale(2);
        Ok(Self(rounded))
    }

    /// Parse a price from user input such as `"9.99"` or `"$9.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number, is negative or too large.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

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
        Ok(Self(amount))
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
    fn test_parse_plain_and_prefixed() {
        assert_eq!(Price::parse("9.99").unwrap().to_string(), "$9.99");
        assert_eq!(Price::parse(" $ 20 ").unwrap().to_string(), "$20.00");
        assert_eq!(Price::parse("0").unwrap().to_string(), "$0.00");
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        assert_eq!(Price::parse("1.005").unwrap().to_string(), "$1.00");
        assert_eq!(Price::parse("1.006").unwrap().to_string(), "$1.01");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("ten"), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_too_large() {
        assert!(matches!(
            Price::parse("100000000"),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(Price::parse("99999999.99").is_ok());
    }

    #[test]
    fn test_max_is_ten_digits_two_scale() {
        assert_eq!(Price::MAX, Decimal::from(100_000_000_i64));
    }

    #[test]
    fn test_ordering() {
        assert!(Price::parse("5").unwrap() < Price::parse("5.01").unwrap());
    }
}
