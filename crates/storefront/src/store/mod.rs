//! Session-scoped cart and wishlist store.
//!
//! The store is a client-side cache of the server's lists: populated once per
//! session by [`SessionStore::bootstrap`], mutated locally through the
//! reconcile operations, and emptied on sign-out by [`SessionStore::clear`].
//! Nothing is persisted.
//!
//! # Bootstrap races
//!
//! While a bootstrap is in flight every local reconcile call is journaled.
//! When a server list arrives it replaces the local list and the journal for
//! that list is replayed on top, so user actions taken before the fetch
//! resolved are kept. Cart changes carry absolute quantities and are replayed
//! as-is. Wishlist toggles are replayed as the adds and removes they produced
//! locally, since flipping a toggle against a different list would invert the
//! user's intent. Replays do not emit telemetry a second time. A
//! [`SessionStore::clear`] during a bootstrap ends the session; the late
//! response is discarded. Only one bootstrap runs at a time; a call made
//! while one is in flight returns [`SyncOutcome::Skipped`] without fetching.

pub mod cart;
pub mod wishlist;

pub use wishlist::ChangeOrigin;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartkit_core::{CartLineItem, CurrencyCode, ProductState, WishlistItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::remote::{RemoteSync, SyncError};
use crate::telemetry::{EventName, TelemetryEvent, TelemetryQueue};

// =============================================================================
// Reconciliation results
// =============================================================================

/// An entry appearing in or disappearing from a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Added(ProductState),
    Removed(ProductState),
}

/// What a reconcile pass did to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Adds and removes, in the order they happened.
    pub transitions: Vec<Transition>,
    /// Whether the list differs from before the pass.
    pub changed: bool,
}

impl Reconciliation {
    fn record(&mut self, transition: Transition) {
        self.transitions.push(transition);
        self.changed = true;
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Progress of the session-start fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No bootstrap has started in this session.
    Idle,
    /// A bootstrap is in flight.
    Syncing,
    /// Both lists were fetched.
    Synced,
    /// At least one list could not be fetched; local state was kept for it.
    Failed,
}

/// What observers see after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub session_id: Uuid,
    pub cart: Vec<CartLineItem>,
    pub wishlist: Vec<WishlistItem>,
    pub sync: SyncStatus,
    pub updated_at: DateTime<Utc>,
}

/// Result of fetching one list during bootstrap.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The local list was replaced by the server's.
    Replaced {
        /// Entries received from the server.
        received: usize,
        /// Journaled local changes replayed on top.
        replayed: usize,
    },
    /// The fetch failed; the local list was kept as is.
    Failed(SyncError),
    /// The session was cleared before the response arrived.
    Discarded,
    /// Another bootstrap was already in flight; nothing was fetched.
    Skipped,
}

impl SyncOutcome {
    /// Whether the server list was applied.
    #[must_use]
    pub const fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Result of [`SessionStore::bootstrap`].
#[derive(Debug)]
pub struct BootstrapReport {
    pub cart: SyncOutcome,
    pub wishlist: SyncOutcome,
}

// =============================================================================
// SessionStore
// =============================================================================

/// The process-wide cart and wishlist for one signed-in session.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<StoreState>,
    notify: watch::Sender<StoreSnapshot>,
    telemetry: TelemetryQueue,
    currency: CurrencyCode,
}

struct StoreState {
    session_id: Uuid,
    /// Bumped by `clear`; bootstrap responses from an older generation are dropped.
    generation: u64,
    cart: Vec<CartLineItem>,
    wishlist: Vec<WishlistItem>,
    sync: SyncStatus,
    /// Local cart changes made while the cart fetch is in flight.
    cart_journal: Option<Vec<Vec<ProductState>>>,
    /// Local wishlist adds and removes made while the wishlist fetch is in flight.
    wishlist_journal: Option<Vec<Transition>>,
    updated_at: DateTime<Utc>,
}

impl StoreState {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            generation: 0,
            cart: Vec::new(),
            wishlist: Vec::new(),
            sync: SyncStatus::Idle,
            cart_journal: None,
            wishlist_journal: None,
            updated_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            session_id: self.session_id,
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
            sync: self.sync,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionStore")
            .field("session_id", &state.session_id)
            .field("cart_lines", &state.cart.len())
            .field("wishlist_items", &state.wishlist.len())
            .field("sync", &state.sync)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(telemetry: TelemetryQueue, currency: CurrencyCode) -> Self {
        let state = StoreState::new();
        let (notify, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                notify,
                telemetry,
                currency,
            }),
        }
    }

    /// A store with telemetry disabled.
    #[must_use]
    pub fn without_telemetry() -> Self {
        Self::new(TelemetryQueue::disabled(), CurrencyCode::default())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // State is always left consistent before any call that could panic.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamp and publish the current state to observers.
    fn publish(&self, state: &mut StoreState) {
        state.updated_at = Utc::now();
        self.inner.notify.send_replace(state.snapshot());
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Current cart lines.
    #[must_use]
    pub fn cart(&self) -> Vec<CartLineItem> {
        self.lock().cart.clone()
    }

    /// Current wishlist entries.
    #[must_use]
    pub fn wishlist(&self) -> Vec<WishlistItem> {
        self.lock().wishlist.clone()
    }

    /// Full current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot()
    }

    /// Receive a snapshot after every change.
    ///
    /// Receivers are only woken when the state actually changed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.inner.notify.subscribe()
    }

    // -------------------------------------------------------------------------
    // Local mutations
    // -------------------------------------------------------------------------

    /// Merge product changes into the cart and return the new cart.
    ///
    /// Emits `add_to_cart` / `remove_from_cart` telemetry for lines that
    /// appear or disappear.
    pub fn reconcile_cart(&self, changes: &[ProductState]) -> Vec<CartLineItem> {
        let (transitions, cart) = {
            let mut state = self.lock();
            let outcome = cart::reconcile(&mut state.cart, changes);

            if let Some(journal) = state.cart_journal.as_mut() {
                journal.push(changes.to_vec());
            }
            if outcome.changed {
                self.publish(&mut state);
            }

            (outcome.transitions, state.cart.clone())
        };

        for transition in &transitions {
            self.emit(transition, EventName::AddToCart, EventName::RemoveFromCart);
        }
        cart
    }

    /// Merge product changes into the wishlist and return the new wishlist.
    ///
    /// Emits `add_to_wishlist` / `remove_from_wishlist` telemetry.
    pub fn reconcile_wishlist(
        &self,
        changes: &[ProductState],
        origin: ChangeOrigin,
    ) -> Vec<WishlistItem> {
        let (transitions, wishlist) = {
            let mut state = self.lock();
            let outcome = wishlist::reconcile(&mut state.wishlist, changes, origin);

            if let Some(journal) = state.wishlist_journal.as_mut() {
                journal.extend(outcome.transitions.iter().cloned());
            }
            if outcome.changed {
                self.publish(&mut state);
            }

            (outcome.transitions, state.wishlist.clone())
        };

        for transition in &transitions {
            self.emit(
                transition,
                EventName::AddToWishlist,
                EventName::RemoveFromWishlist,
            );
        }
        wishlist
    }

    fn emit(&self, transition: &Transition, added: EventName, removed: EventName) {
        let (name, product) = match transition {
            Transition::Added(product) => (added, product),
            Transition::Removed(product) => (removed, product),
        };
        self.inner
            .telemetry
            .emit(TelemetryEvent::for_product(name, product, self.inner.currency));
    }

    /// Replace the whole cart.
    ///
    /// Duplicate product ids keep their first occurrence.
    pub fn replace_cart(&self, items: Vec<CartLineItem>) {
        let mut state = self.lock();
        state.cart = dedup_by_product(items, |line| line.product_id.as_i32());
        self.publish(&mut state);
    }

    /// Replace the whole wishlist.
    ///
    /// Duplicate product ids keep their first occurrence.
    pub fn replace_wishlist(&self, items: Vec<WishlistItem>) {
        let mut state = self.lock();
        state.wishlist = dedup_by_product(items, |item| item.product_id.as_i32());
        self.publish(&mut state);
    }

    /// Sign-out: empty both lists and abandon any bootstrap in flight.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.session_id = Uuid::new_v4();
        state.cart.clear();
        state.wishlist.clear();
        state.cart_journal = None;
        state.wishlist_journal = None;
        state.sync = SyncStatus::Idle;
        self.publish(&mut state);
        info!("Session store cleared");
    }

    // -------------------------------------------------------------------------
    // Remote sync
    // -------------------------------------------------------------------------

    /// Fetch both lists from the server and replace the local ones.
    ///
    /// The two fetches run concurrently and each list is replaced as soon as
    /// its response arrives. A failed fetch is logged and leaves that list
    /// untouched; nothing is retried. If a bootstrap is already in flight
    /// this returns at once with both outcomes [`SyncOutcome::Skipped`].
    #[instrument(skip(self, remote))]
    pub async fn bootstrap<R: RemoteSync>(&self, remote: &R) -> BootstrapReport {
        let Some(generation) = self.begin_sync() else {
            return BootstrapReport {
                cart: SyncOutcome::Skipped,
                wishlist: SyncOutcome::Skipped,
            };
        };

        let (cart, wishlist) = tokio::join!(
            async {
                let fetched = remote.fetch_cart().await;
                self.apply_cart_fetch(generation, fetched)
            },
            async {
                let fetched = remote.fetch_wishlist().await;
                self.apply_wishlist_fetch(generation, fetched)
            },
        );

        self.finish_sync(generation, &cart, &wishlist);
        BootstrapReport { cart, wishlist }
    }

    fn begin_sync(&self) -> Option<u64> {
        let mut state = self.lock();
        if state.sync == SyncStatus::Syncing {
            debug!(session_id = %state.session_id, "Bootstrap already in flight");
            return None;
        }

        state.cart_journal = Some(Vec::new());
        state.wishlist_journal = Some(Vec::new());
        state.sync = SyncStatus::Syncing;
        self.publish(&mut state);
        debug!(session_id = %state.session_id, "Bootstrap started");
        Some(state.generation)
    }

    fn apply_cart_fetch(
        &self,
        generation: u64,
        fetched: Result<Vec<CartLineItem>, SyncError>,
    ) -> SyncOutcome {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Session cleared during bootstrap, discarding cart response");
            return SyncOutcome::Discarded;
        }

        let journal = state.cart_journal.take().unwrap_or_default();
        match fetched {
            Ok(items) => {
                let received = items.len();
                let mut cart = dedup_by_product(items, |line| line.product_id.as_i32());
                for changes in &journal {
                    cart::reconcile(&mut cart, changes);
                }
                state.cart = cart;
                self.publish(&mut state);
                info!(received, replayed = journal.len(), "Cart synced");
                SyncOutcome::Replaced {
                    received,
                    replayed: journal.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart, keeping local state");
                SyncOutcome::Failed(e)
            }
        }
    }

    fn apply_wishlist_fetch(
        &self,
        generation: u64,
        fetched: Result<Vec<WishlistItem>, SyncError>,
    ) -> SyncOutcome {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Session cleared during bootstrap, discarding wishlist response");
            return SyncOutcome::Discarded;
        }

        let journal = state.wishlist_journal.take().unwrap_or_default();
        match fetched {
            Ok(items) => {
                let received = items.len();
                let mut wishlist = dedup_by_product(items, |item| item.product_id.as_i32());
                wishlist::apply_transitions(&mut wishlist, &journal);
                state.wishlist = wishlist;
                self.publish(&mut state);
                info!(received, replayed = journal.len(), "Wishlist synced");
                SyncOutcome::Replaced {
                    received,
                    replayed: journal.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist, keeping local state");
                SyncOutcome::Failed(e)
            }
        }
    }

    fn finish_sync(&self, generation: u64, cart: &SyncOutcome, wishlist: &SyncOutcome) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }

        state.sync = if cart.is_replaced() && wishlist.is_replaced() {
            SyncStatus::Synced
        } else {
            SyncStatus::Failed
        };
        self.publish(&mut state);
    }
}

/// Keep the first entry for each product id, preserving order.
fn dedup_by_product<T>(items: Vec<T>, key: impl Fn(&T) -> i32) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let unique: Vec<T> = items.into_iter().filter(|item| seen.insert(key(item))).collect();

    if unique.len() != before {
        warn!(
            dropped = before - unique.len(),
            "Dropped duplicate product ids from replaced list"
        );
    }
    unique
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cartkit_core::ProductId;

    use super::*;

    fn line(id: i32, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(id),
            quantity,
            buying_by_secondary: false,
            selected_option: None,
            picture_url: String::new(),
        }
    }

    #[test]
    fn test_reconcile_cart_returns_updated_list() {
        let store = SessionStore::without_telemetry();
        let cart = store.reconcile_cart(&[ProductState::with_quantity(7, 2)]);

        assert_eq!(cart, vec![line(7, 2)]);
        assert_eq!(store.cart(), cart);
    }

    #[test]
    fn test_reconcile_wishlist_toggle() {
        let store = SessionStore::without_telemetry();
        let liked = ProductState::with_quantity(9, 0);

        assert_eq!(store.reconcile_wishlist(&[liked.clone()], ChangeOrigin::Toggle).len(), 1);
        assert!(store.reconcile_wishlist(&[liked], ChangeOrigin::Toggle).is_empty());
    }

    #[test]
    fn test_clear_empties_both_lists_and_rotates_session() {
        let store = SessionStore::without_telemetry();
        let before = store.snapshot().session_id;
        store.reconcile_cart(&[ProductState::with_quantity(1, 1)]);
        store.reconcile_wishlist(&[ProductState::with_quantity(2, 0)], ChangeOrigin::Toggle);

        store.clear();

        let snapshot = store.snapshot();
        assert!(snapshot.cart.is_empty());
        assert!(snapshot.wishlist.is_empty());
        assert_eq!(snapshot.sync, SyncStatus::Idle);
        assert_ne!(snapshot.session_id, before);
    }

    #[test]
    fn test_replace_cart_drops_duplicate_ids() {
        let store = SessionStore::without_telemetry();
        store.replace_cart(vec![line(1, 1), line(2, 2), line(1, 9)]);
        assert_eq!(store.cart(), vec![line(1, 1), line(2, 2)]);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let store = SessionStore::without_telemetry();
        let mut rx = store.subscribe();

        // Absent product with zero quantity changes nothing.
        store.reconcile_cart(&[ProductState::with_quantity(5, 0)]);
        assert!(!rx.has_changed().unwrap());

        store.reconcile_cart(&[ProductState::with_quantity(5, 3)]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().cart, vec![line(5, 3)]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::without_telemetry();
        let other = store.clone();
        other.reconcile_cart(&[ProductState::with_quantity(3, 1)]);
        assert_eq!(store.cart().len(), 1);
    }
}
