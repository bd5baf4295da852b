//! Cart and wishlist entries, and the product-state input that drives them.
//!
//! JSON forms use camelCase keys to match the storefront backend. Fields that
//! the backend may omit fall back to their empty values instead of failing
//! deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One product line in the shopping cart.
///
/// At most one line exists per `product_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Whether the product is bought by its secondary unit (e.g. by the box).
    #[serde(default)]
    pub buying_by_secondary: bool,
    #[serde(default)]
    pub selected_option: Option<String>,
    #[serde(default)]
    pub picture_url: String,
}

impl From<&ProductState> for CartLineItem {
    fn from(product: &ProductState) -> Self {
        Self {
            product_id: product.id,
            quantity: product.current_cart_quantity,
            buying_by_secondary: product.buying_by_secondary,
            selected_option: product.selected_option.clone(),
            picture_url: product.picture_url.clone(),
        }
    }
}

/// A liked product.
///
/// At most one entry exists per `product_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtotal: Decimal,
}

impl From<&ProductState> for WishlistItem {
    fn from(product: &ProductState) -> Self {
        Self {
            product_id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            subtotal: product.subtotal,
        }
    }
}

/// The state of a product as seen by the UI after a user action.
///
/// Lists exactly the fields reconciliation reads. Unknown keys are rejected
/// so an unrelated payload cannot pass for a product change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductState {
    pub id: ProductId,
    #[serde(default)]
    pub current_cart_quantity: u32,
    #[serde(default)]
    pub buying_by_secondary: bool,
    #[serde(default)]
    pub selected_option: Option<String>,
    #[serde(default)]
    pub picture_url: String,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
}

impl ProductState {
    /// A product change carrying only an id and a cart quantity.
    #[must_use]
    pub fn with_quantity(id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            current_cart_quantity: quantity,
            ..Self::default()
        }
    }

    /// Whether the product is currently in the cart.
    #[must_use]
    pub const fn in_cart(&self) -> bool {
        self.current_cart_quantity > 0
    }
}
