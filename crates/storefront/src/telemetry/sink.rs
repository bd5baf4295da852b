//! Telemetry sinks.
//!
//! A sink delivers one event. Delivery is best effort: callers log failures
//! and move on.

use std::future::Future;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::info;
use url::Url;

use super::TelemetryError;
use super::event::TelemetryEvent;
use crate::config::TelemetryConfig;

/// Destination for analytics events.
pub trait TelemetrySink: Send + Sync {
    /// Deliver a single event.
    fn send(&self, event: &TelemetryEvent)
    -> impl Future<Output = Result<(), TelemetryError>> + Send;
}

/// Posts events as JSON to an analytics collector.
#[derive(Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSink {
    /// Create a sink for the configured collector endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(endpoint: Url, config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .map_err(|e| TelemetryError::InvalidKey(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }
}

impl TelemetrySink for HttpSink {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TelemetryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Writes events to the log instead of a collector.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        info!(
            event = %event.name,
            value = %event.params.price(),
            items = event.params.items.len(),
            "Telemetry event"
        );
        Ok(())
    }
}
