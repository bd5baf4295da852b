//! Cartkit Storefront - session cart and wishlist stores.
//!
//! # Architecture
//!
//! - [`store`] - reconciliation functions and the session-scoped [`SessionStore`]
//! - [`remote`] - the backend's cart and wishlist endpoints ([`RemoteSync`])
//! - [`telemetry`] - fire-and-forget analytics for add/remove transitions
//! - [`config`] - environment-driven configuration
//!
//! Data flows one way per operation: a UI event calls a reconcile operation,
//! the store updates its list and notifies subscribers, and telemetry is
//! scheduled on a detached worker. Independently, [`SessionStore::bootstrap`]
//! replaces both lists with the server's once per session.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartkit_storefront::{HttpRemote, SessionStore, StoreConfig, telemetry};
//! use cartkit_core::ProductState;
//!
//! let config = StoreConfig::from_env()?;
//! let queue = telemetry::queue_from_config(&config.telemetry)?;
//! let store = SessionStore::new(queue, config.currency);
//!
//! let remote = HttpRemote::new(&config.remote)?;
//! store.bootstrap(&remote).await;
//!
//! let cart = store.reconcile_cart(&[ProductState::with_quantity(7, 2)]);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod remote;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, RemoteConfig, StoreConfig, TelemetryConfig};
pub use error::{Result, StoreError};
pub use remote::{CartLineUpdate, HttpRemote, RemoteSync, SyncError};
pub use store::{
    BootstrapReport, ChangeOrigin, Reconciliation, SessionStore, StoreSnapshot, SyncOutcome,
    SyncStatus, Transition,
};
pub use telemetry::{TelemetryEvent, TelemetryQueue, TelemetrySink};
