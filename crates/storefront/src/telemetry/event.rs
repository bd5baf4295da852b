//! Analytics events emitted on cart and wishlist transitions.

use cartkit_core::{CurrencyCode, Price, ProductState};
use rust_decimal::Decimal;
use serde::Serialize;

/// Name of an analytics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    AddToCart,
    RemoveFromCart,
    AddToWishlist,
    RemoveFromWishlist,
}

impl EventName {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::RemoveFromCart => "remove_from_cart",
            Self::AddToWishlist => "add_to_wishlist",
            Self::RemoveFromWishlist => "remove_from_wishlist",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product referenced by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventItem {
    pub item_id: String,
    pub item_name: String,
}

/// Event parameters: `{value, currency, items: [{item_id, item_name}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventParams {
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub currency: CurrencyCode,
    pub items: Vec<EventItem>,
}

impl EventParams {
    /// The event value as a price in its currency.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.value, self.currency)
    }
}

/// A named analytics event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    pub name: EventName,
    pub params: EventParams,
}

impl TelemetryEvent {
    /// Build an event for a single product.
    ///
    /// The product's SKU is the item id; products without a SKU fall back to
    /// their numeric id.
    #[must_use]
    pub fn for_product(name: EventName, product: &ProductState, currency: CurrencyCode) -> Self {
        let item_id = if product.sku.is_empty() {
            product.id.to_string()
        } else {
            product.sku.clone()
        };

        Self {
            name,
            params: EventParams {
                value: product.subtotal,
                currency,
                items: vec![EventItem {
                    item_id,
                    item_name: product.name.clone(),
                }],
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cartkit_core::ProductId;

    use super::*;

    #[test]
    fn test_event_payload_shape() {
        let product = ProductState {
            id: ProductId::new(7),
            current_cart_quantity: 2,
            sku: "A".to_string(),
            name: "Apples".to_string(),
            subtotal: Decimal::new(1050, 2),
            ..ProductState::default()
        };
        let event = TelemetryEvent::for_product(EventName::AddToCart, &product, CurrencyCode::EUR);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "add_to_cart",
                "params": {
                    "value": 10.5,
                    "currency": "EUR",
                    "items": [{"item_id": "A", "item_name": "Apples"}]
                }
            })
        );
    }

    #[test]
    fn test_item_id_falls_back_to_product_id() {
        let product = ProductState::with_quantity(42, 0);
        let event =
            TelemetryEvent::for_product(EventName::RemoveFromCart, &product, CurrencyCode::USD);
        assert_eq!(event.params.items[0].item_id, "42");
    }

    #[test]
    fn test_params_price_display() {
        let product = ProductState {
            subtotal: Decimal::new(1999, 2),
            ..ProductState::with_quantity(3, 1)
        };
        let event = TelemetryEvent::for_product(EventName::AddToCart, &product, CurrencyCode::GBP);
        assert_eq!(event.params.price().to_string(), "£19.99");
    }

    #[test]
    fn test_event_name_display_matches_serde() {
        for name in [
            EventName::AddToCart,
            EventName::RemoveFromCart,
            EventName::AddToWishlist,
            EventName::RemoveFromWishlist,
        ] {
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, serde_json::Value::String(name.to_string()));
        }
    }
}
