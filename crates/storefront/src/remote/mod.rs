//! Remote sync service for the authoritative cart and wishlist.
//!
//! The server is the source of truth. The store only caches what these
//! endpoints return and fetches it once per session.
//!
//! # Endpoints
//!
//! | operation | request |
//! |-----------|---------|
//! | [`RemoteSync::fetch_cart`] | `GET {base}/cart` |
//! | [`RemoteSync::fetch_wishlist`] | `GET {base}/wishlist` |
//! | [`RemoteSync::push_cart`] | `POST {base}/cart/items` with a JSON array of [`CartLineUpdate`] |
//! | [`RemoteSync::toggle_wishlist`] | `POST {base}/wishlist/{product_id}/toggle` |

mod http;

pub use http::HttpRemote;

use std::future::Future;

use cartkit_core::{CartLineItem, ProductId, ProductState, WishlistItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Access token cannot be sent as a header.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),
}

/// One entry of a batched cart update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdate {
    pub product_id: ProductId,
    pub quantity: u32,
    pub buying_by_secondary: bool,
    pub selected_option: Option<String>,
}

impl From<&ProductState> for CartLineUpdate {
    fn from(product: &ProductState) -> Self {
        Self {
            product_id: product.id,
            quantity: product.current_cart_quantity,
            buying_by_secondary: product.buying_by_secondary,
            selected_option: product.selected_option.clone(),
        }
    }
}

/// Read and write access to the server's cart and wishlist.
///
/// Reads are idempotent. Writes are sent as-is; the store is not updated
/// from their responses.
pub trait RemoteSync: Send + Sync {
    /// Fetch the authoritative cart for the current session.
    fn fetch_cart(&self) -> impl Future<Output = Result<Vec<CartLineItem>, SyncError>> + Send;

    /// Fetch the authoritative wishlist for the current session.
    fn fetch_wishlist(&self)
    -> impl Future<Output = Result<Vec<WishlistItem>, SyncError>> + Send;

    /// Send a batch of quantity/property updates for the cart.
    fn push_cart(
        &self,
        updates: &[CartLineUpdate],
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Toggle a single product on the wishlist.
    fn toggle_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;
}
