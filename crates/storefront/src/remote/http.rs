//! HTTP implementation of [`RemoteSync`].

use std::sync::Arc;

use cartkit_core::{CartLineItem, ProductId, WishlistItem};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CartLineUpdate, RemoteSync, SyncError};
use crate::config::RemoteConfig;

/// Client for the storefront backend's cart and wishlist endpoints.
#[derive(Clone)]
pub struct HttpRemote {
    inner: Arc<HttpRemoteInner>,
}

struct HttpRemoteInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| SyncError::InvalidToken(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpRemoteInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
            }),
        })
    }

    /// Resolve a path relative to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let url = self.endpoint(path)?;
        let response = self.inner.client.get(url).send().await?;
        let body = check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            SyncError::Parse(e)
        })
    }
}

impl RemoteSync for HttpRemote {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, SyncError> {
        let items: Vec<CartLineItem> = self.get_json("cart").await?;
        debug!(lines = items.len(), "Fetched cart");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>, SyncError> {
        let items: Vec<WishlistItem> = self.get_json("wishlist").await?;
        debug!(items = items.len(), "Fetched wishlist");
        Ok(items)
    }

    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    async fn push_cart(&self, updates: &[CartLineUpdate]) -> Result<(), SyncError> {
        let url = self.endpoint("cart/items")?;
        let response = self.inner.client.post(url).json(updates).send().await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_wishlist(&self, product_id: ProductId) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("wishlist/{product_id}/toggle"))?;
        let response = self.inner.client.post(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Map rate limiting and non-success statuses to errors; return the body otherwise.
async fn check_status(response: reqwest::Response) -> Result<String, SyncError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(SyncError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(SyncError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    Ok(body)
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
