//! Money value object: integer minor units plus a currency code.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ServiceError;

/// Amount in minor currency units (e.g. cents).
///
/// Equality is by value. The display string is derived from `value` on demand
/// and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Money {
    pub value: i64,
    pub currency: String,
}

impl Money {
    pub fn new(value: i64, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    /// `value / 100` with exactly two decimals, e.g. `999` -> `"9.99"`.
    pub fn display_value(&self) -> String {
        let sign = if self.value < 0 { "-" } else { "" };
        let abs = self.value.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// `self * quantity`, failing on overflow.
    pub fn checked_mul(&self, quantity: i64) -> Result<Money, ServiceError> {
        let value = self
            .value
            .checked_mul(quantity)
            .ok_or_else(|| ServiceError::invalid_argument("amount overflows"))?;
        Ok(Money::new(value, self.currency.clone()))
    }

    /// `self + other`, failing on overflow or mixed currencies.
    pub fn checked_add(&self, other: &Money) -> Result<Money, ServiceError> {
        if self.currency != other.currency {
            return Err(ServiceError::invalid_argument(format!(
                "mixed currencies: {} and {}",
                self.currency, other.currency
            )));
        }
        let value = self
            .value
            .checked_add(other.value)
            .ok_or_else(|| ServiceError::invalid_argument("amount overflows"))?;
        Ok(Money::new(value, self.currency.clone()))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.display_value(), self.currency)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Money", 3)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("currency", &self.currency)?;
        s.serialize_field("display_value", &self.display_value())?;
        s.end()
    }
}
