//! Strongly-typed identifiers for items, orders, and shipments.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

/// Identifier of an inventory item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

/// Identifier of a customer order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

/// Identifier of a shipment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $field:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Parse a caller-supplied identifier.
            ///
            /// Empty input is reported as a missing field; anything else that
            /// is not a UUID (surrounding whitespace included) is malformed.
            pub fn parse_required(s: &str) -> Result<Self, ServiceError> {
                if s.is_empty() {
                    return Err(ServiceError::invalid_argument(concat!($field, " required")));
                }
                s.parse()
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s).map_err(|e| {
                    ServiceError::invalid_argument(format!("malformed {}: {}", $field, e))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(ItemId, "item id");
impl_uuid_newtype!(OrderId, "order id");
impl_uuid_newtype!(ShipmentId, "shipment id");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Code;

    #[test]
    fn parse_required_rejects_empty_and_malformed() {
        let empty = OrderId::parse_required("").unwrap_err();
        assert_eq!(empty.code(), Code::InvalidArgument);
        assert_eq!(empty.message(), "order id required");

        let bad = ItemId::parse_required("not-a-uuid").unwrap_err();
        assert_eq!(bad.code(), Code::InvalidArgument);

        let padded = format!(" {} ", ItemId::new());
        assert_eq!(ItemId::parse_required(&padded).unwrap_err().code(), Code::InvalidArgument);
    }

    #[test]
    fn display_and_parse_agree() {
        let id = ShipmentId::new();
        let parsed = ShipmentId::parse_required(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }
}
