//! CLI command implementations.

pub mod reconcile;
pub mod sync;

use std::io::Write;

use cartkit_storefront::store::SyncOutcome;
use cartkit_storefront::{
    BootstrapReport, HttpRemote, SessionStore, StoreConfig, StoreSnapshot, TelemetryQueue,
    telemetry,
};
use tracing::info;

/// A bootstrapped store and the backend it talks to.
pub struct Session {
    pub store: SessionStore,
    pub remote: HttpRemote,
    pub telemetry: TelemetryQueue,
}

impl Session {
    /// Build the store, telemetry queue and backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the telemetry sink or HTTP client cannot be built.
    pub fn open(config: &StoreConfig) -> cartkit_storefront::Result<Self> {
        let telemetry = telemetry::queue_from_config(&config.telemetry)?;
        let store = SessionStore::new(telemetry.clone(), config.currency);
        let remote = HttpRemote::new(&config.remote)?;

        Ok(Self {
            store,
            remote,
            telemetry,
        })
    }

    /// Fetch the server lists into the store.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let report = self.store.bootstrap(&self.remote).await;
        log_outcome("cart", &report.cart);
        log_outcome("wishlist", &report.wishlist);
        report
    }

    /// Deliver pending telemetry before the process exits.
    pub async fn close(self) {
        self.telemetry.flush().await;
    }
}

fn log_outcome(list: &str, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Replaced { received, replayed } => {
            info!(list, received, replayed, "Loaded from server");
        }
        SyncOutcome::Failed(e) => info!(list, error = %e, "Kept local state"),
        SyncOutcome::Discarded => info!(list, "Response discarded"),
        SyncOutcome::Skipped => info!(list, "Bootstrap already in flight"),
    }
}

/// Write a snapshot to stdout as pretty JSON.
///
/// # Errors
///
/// Returns error if serialization or the write fails.
pub fn print_snapshot(snapshot: &StoreSnapshot) -> cartkit_storefront::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
