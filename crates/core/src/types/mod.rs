//! Core types for Cartkit.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line_item;
pub mod price;

pub use id::*;
pub use line_item::{CartLineItem, ProductState, WishlistItem};
pub use price::{CurrencyCode, Price, UnknownCurrency};
