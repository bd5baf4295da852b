//! Integration tests for Cartkit.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartkit-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_bootstrap` - store bootstrap against a scripted backend
//! - `http_remote` - the HTTP client against an in-process server
//! - `reconcile_properties` - property tests for the reconciliation rules
//!
//! Shared fixtures live here so every test file builds products the same way.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartkit_core::{CartLineItem, ProductId, ProductState, WishlistItem};
use rust_decimal::Decimal;

/// A cart line with only id and quantity set.
#[must_use]
pub fn line(id: i32, quantity: u32) -> CartLineItem {
    CartLineItem {
        product_id: ProductId::new(id),
        quantity,
        buying_by_secondary: false,
        selected_option: None,
        picture_url: String::new(),
    }
}

/// A wishlist entry with a predictable SKU and name.
#[must_use]
pub fn liked(id: i32) -> WishlistItem {
    WishlistItem::from(&product(id, 0))
}

/// A product change with predictable SKU, name and subtotal.
#[must_use]
pub fn product(id: i32, quantity: u32) -> ProductState {
    ProductState {
        id: ProductId::new(id),
        current_cart_quantity: quantity,
        sku: format!("SKU-{id}"),
        name: format!("Product {id}"),
        subtotal: Decimal::new(i64::from(id) * 100, 2),
        ..ProductState::default()
    }
}
