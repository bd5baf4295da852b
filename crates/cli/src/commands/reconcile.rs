//! `cartkit reconcile` - apply product changes from a file.

use std::path::PathBuf;

use cartkit_core::ProductState;
use cartkit_storefront::{CartLineUpdate, ChangeOrigin, RemoteSync, StoreConfig};
use tracing::info;

use super::{Session, print_snapshot};
use crate::Target;

/// Options for a reconcile run.
pub struct Options {
    pub changes: PathBuf,
    pub target: Target,
    pub toggle: bool,
    pub push: bool,
}

/// Bootstrap a session, apply the changes and print the snapshot.
///
/// With `push`, cart changes are sent as one batch and wishlist toggles are
/// sent one product at a time. Refresh-origin wishlist changes are never
/// pushed.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, the session cannot be
/// built, a push fails, or output cannot be written.
pub async fn run(config: &StoreConfig, options: Options) -> cartkit_storefront::Result<()> {
    let raw = tokio::fs::read_to_string(&options.changes).await?;
    let changes: Vec<ProductState> = serde_json::from_str(&raw)?;
    info!(path = %options.changes.display(), changes = changes.len(), "Loaded product changes");

    let session = Session::open(config)?;
    session.bootstrap().await;

    match options.target {
        Target::Cart => {
            let cart = session.store.reconcile_cart(&changes);
            info!(lines = cart.len(), "Cart reconciled");

            if options.push {
                let updates: Vec<CartLineUpdate> =
                    changes.iter().map(CartLineUpdate::from).collect();
                session.remote.push_cart(&updates).await?;
                info!(updates = updates.len(), "Cart changes pushed");
            }
        }
        Target::Wishlist => {
            let origin = ChangeOrigin::from_toggle(options.toggle);
            let wishlist = session.store.reconcile_wishlist(&changes, origin);
            info!(items = wishlist.len(), ?origin, "Wishlist reconciled");

            if options.push && origin == ChangeOrigin::Toggle {
                for product in &changes {
                    session.remote.toggle_wishlist(product.id).await?;
                }
                info!(toggles = changes.len(), "Wishlist toggles pushed");
            }
        }
    }

    print_snapshot(&session.store.snapshot())?;
    session.close().await;
    Ok(())
}
