//! `cartkit sync` - bootstrap a session and print it.

use cartkit_storefront::store::SyncOutcome;
use cartkit_storefront::{StoreConfig, StoreError};

use super::{Session, print_snapshot};

/// Fetch the server cart and wishlist and print the resulting snapshot.
///
/// The snapshot is printed even when a fetch fails; the first failure is
/// then returned so the process exits non-zero.
///
/// # Errors
///
/// Returns error if the session cannot be built, a fetch fails, or output
/// cannot be written.
pub async fn run(config: &StoreConfig) -> cartkit_storefront::Result<()> {
    let session = Session::open(config)?;
    let report = session.bootstrap().await;

    print_snapshot(&session.store.snapshot())?;
    session.close().await;

    for outcome in [report.cart, report.wishlist] {
        if let SyncOutcome::Failed(e) = outcome {
            return Err(StoreError::Sync(e));
        }
    }
    Ok(())
}
