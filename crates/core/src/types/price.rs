//! Type-safe price representation using decimal arithmetic.
//!
//! The ERP reports `list_price` as a JSON float (`19.99`). Converting that
//! float straight into a binary-derived decimal would yield
//! `19.989999999999998436805981327779591083526611328125`, so conversion goes
//! through the shortest round-trip decimal string instead.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building a [`Price`] from external input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// The ERP sent `NaN` or an infinite value.
    #[error("price is not a finite number: {0}")]
    NotFinite(String),

    /// The value does not fit in a decimal.
    #[error("price out of range: {0}")]
    OutOfRange(String),
}

/// A regular (list) price in the shop's base currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero price, used for products that have never been priced.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from the float the ERP puts on the wire.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotFinite` for `NaN`/infinity and
    /// `PriceError::OutOfRange` if the value exceeds decimal precision.
    pub fn from_erp_float(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotFinite(value.to_string()));
        }

        let text = value.to_string();
        Decimal::from_str(&text)
            .map(|amount| Self(amount.normalize()))
            .map_err(|_| PriceError::OutOfRange(text))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Price {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Price {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
