//! Cartkit Core - Shared types library.
//!
//! This crate provides common types used across all Cartkit components:
//! - `storefront` - Cart and wishlist stores, telemetry, remote sync
//! - `cli` - Command-line tool for syncing and reconciling a session
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart lines, wishlist items, and the
//!   product-state input that drives reconciliation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
