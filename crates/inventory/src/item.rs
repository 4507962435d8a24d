use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ItemId, Money, ServiceError};

/// An inventory item: stock on hand plus its current unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Units on hand. Never negative.
    pub quantity: i64,
    pub unit_price: Money,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether `requested` units can be taken from stock.
    pub fn has_stock_for(&self, requested: i64) -> bool {
        requested > 0 && self.quantity >= requested
    }

    /// Conditional decrement: subtract `requested` only if enough is on hand.
    ///
    /// Returns `false` and leaves the item untouched otherwise.
    pub fn try_decrement(&mut self, requested: i64) -> bool {
        if !self.has_stock_for(requested) {
            return false;
        }
        self.quantity -= requested;
        true
    }
}

/// Validated mutable fields of an item, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    name: String,
    description: String,
    quantity: i64,
    unit_price: Money,
}

impl ItemDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, ServiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ServiceError::invalid_argument("item name required"));
        }
        if quantity < 0 {
            return Err(ServiceError::invalid_argument("quantity cannot be negative"));
        }
        if unit_price.value < 0 {
            return Err(ServiceError::invalid_argument("unit price cannot be negative"));
        }
        if unit_price.currency.is_empty() {
            return Err(ServiceError::invalid_argument("currency required"));
        }

        Ok(Self {
            name,
            description: description.into(),
            quantity,
            unit_price,
        })
    }

    /// Materialize the draft under `id`, stamped with `now`.
    pub fn into_item(self, id: ItemId, now: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            updated_at: now,
        }
    }
}

/// Listing filter: substring match on the item name (empty matches all).
///
/// Matching ignores ASCII case, the same folding SQLite's `lower()` applies.
/// `%` and `_` are literal characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub name_contains: String,
}

impl ItemFilter {
    pub fn new(name_contains: impl Into<String>) -> Self {
        Self {
            name_contains: name_contains.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.name_contains.is_empty()
            || item
                .name
                .to_ascii_lowercase()
                .contains(&self.name_contains.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stockflow_core::Code;

    fn usd(value: i64) -> Money {
        Money::new(value, "USD")
    }

    fn widget(quantity: i64) -> Item {
        ItemDraft::new("Widget", "", quantity, usd(999))
            .unwrap()
            .into_item(ItemId::new(), Utc::now())
    }

    #[test]
    fn draft_rejects_invalid_fields() {
        let cases = [
            ItemDraft::new("", "d", 1, usd(1)),
            ItemDraft::new("Widget", "d", -1, usd(1)),
            ItemDraft::new("Widget", "d", 1, usd(-1)),
            ItemDraft::new("Widget", "d", 1, Money::new(1, "")),
        ];
        for case in cases {
            assert_eq!(case.unwrap_err().code(), Code::InvalidArgument);
        }
    }

    #[test]
    fn draft_accepts_zero_stock_and_free_items() {
        let item = ItemDraft::new("Sample", "", 0, usd(0))
            .unwrap()
            .into_item(ItemId::new(), Utc::now());
        assert_eq!(item.quantity, 0);
        assert_eq!(item.unit_price.display_value(), "0.00");
    }

    #[test]
    fn decrement_is_all_or_nothing() {
        let mut item = widget(5);
        assert!(!item.try_decrement(10));
        assert_eq!(item.quantity, 5);

        assert!(item.try_decrement(5));
        assert_eq!(item.quantity, 0);
        assert!(!item.try_decrement(1));
    }

    #[test]
    fn decrement_rejects_non_positive_requests() {
        let mut item = widget(5);
        assert!(!item.try_decrement(0));
        assert!(!item.try_decrement(-3));
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn filter_matches_substring() {
        let item = widget(1);
        assert!(ItemFilter::default().matches(&item));
        assert!(ItemFilter::new("idg").matches(&item));
        assert!(!ItemFilter::new("Gadget").matches(&item));
    }

    #[test]
    fn filter_ignores_ascii_case() {
        let item = widget(1);
        assert!(ItemFilter::new("widget").matches(&item));
        assert!(ItemFilter::new("WIDG").matches(&item));
        assert!(!ItemFilter::new("w%t").matches(&item));
    }

    proptest! {
        #[test]
        fn quantity_never_negative(start in 0i64..1_000, requests in proptest::collection::vec(-5i64..50, 0..40)) {
            let mut item = widget(start);
            for r in requests {
                item.try_decrement(r);
                prop_assert!(item.quantity >= 0);
            }
        }
    }
}
