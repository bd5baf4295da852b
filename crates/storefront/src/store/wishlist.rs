//! Wishlist reconciliation.
//!
//! A wishlist has no quantity, so presence alone cannot say whether a change
//! means "unlike". The caller passes the [`ChangeOrigin`] instead.

use cartkit_core::{ProductState, WishlistItem};

use super::{Reconciliation, Transition};

/// Where a wishlist change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// An explicit "like" toggle by the user. Presence means remove.
    Toggle,
    /// A server-driven refresh. Never removes what is already liked.
    Refresh,
}

impl ChangeOrigin {
    /// Map the boolean "is toggle origin" flag used by UI callers.
    #[must_use]
    pub const fn from_toggle(is_toggle_origin: bool) -> Self {
        if is_toggle_origin {
            Self::Toggle
        } else {
            Self::Refresh
        }
    }
}

/// Apply `changes` to `items` in input order.
///
/// For each changed product:
/// - absent: append ([`Transition::Added`])
/// - present and origin is [`ChangeOrigin::Toggle`]: remove ([`Transition::Removed`])
/// - present and origin is [`ChangeOrigin::Refresh`]: nothing
pub fn reconcile(
    items: &mut Vec<WishlistItem>,
    changes: &[ProductState],
    origin: ChangeOrigin,
) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for product in changes {
        let position = items.iter().position(|item| item.product_id == product.id);

        match (position, origin) {
            (None, _) => {
                items.push(WishlistItem::from(product));
                outcome.record(Transition::Added(product.clone()));
            }
            (Some(index), ChangeOrigin::Toggle) => {
                items.remove(index);
                outcome.record(Transition::Removed(product.clone()));
            }
            (Some(_), ChangeOrigin::Refresh) => {}
        }
    }

    outcome
}

/// Re-apply recorded adds and removes to another list.
///
/// An add makes the product present, a remove makes it absent; entries that
/// already match are left alone.
pub fn apply_transitions(items: &mut Vec<WishlistItem>, transitions: &[Transition]) {
    for transition in transitions {
        match transition {
            Transition::Added(product) => {
                if !items.iter().any(|item| item.product_id == product.id) {
                    items.push(WishlistItem::from(product));
                }
            }
            Transition::Removed(product) => {
                items.retain(|item| item.product_id != product.id);
            }
        }
    }
}

/// Value-returning form of [`reconcile`].
#[must_use]
pub fn reconciled(
    items: &[WishlistItem],
    changes: &[ProductState],
    origin: ChangeOrigin,
) -> Vec<WishlistItem> {
    let mut updated = items.to_vec();
    reconcile(&mut updated, changes, origin);
    updated
}

#[cfg(test)]
mod tests {
    use cartkit_core::ProductId;

    use super::*;

    fn liked(id: i32) -> ProductState {
        ProductState {
            id: ProductId::new(id),
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            ..ProductState::default()
        }
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut items = Vec::new();

        let first = reconcile(&mut items, &[liked(9)], ChangeOrigin::Toggle);
        assert_eq!(items.len(), 1);
        assert_eq!(first.transitions, vec![Transition::Added(liked(9))]);

        let second = reconcile(&mut items, &[liked(9)], ChangeOrigin::Toggle);
        assert!(items.is_empty());
        assert_eq!(second.transitions, vec![Transition::Removed(liked(9))]);
    }

    #[test]
    fn test_refresh_keeps_existing_entry() {
        let mut items = vec![WishlistItem::from(&liked(9))];
        let outcome = reconcile(&mut items, &[liked(9)], ChangeOrigin::Refresh);

        assert_eq!(items, vec![WishlistItem::from(&liked(9))]);
        assert!(!outcome.changed);
        assert!(outcome.transitions.is_empty());
    }

    #[test]
    fn test_refresh_adds_missing_entry() {
        let mut items = Vec::new();
        let outcome = reconcile(&mut items, &[liked(4)], ChangeOrigin::Refresh);

        assert_eq!(items.len(), 1);
        assert!(outcome.changed);
    }

    #[test]
    fn test_apply_transitions_sets_presence() {
        let mut items = vec![WishlistItem::from(&liked(1)), WishlistItem::from(&liked(2))];
        apply_transitions(
            &mut items,
            &[
                Transition::Added(liked(1)),
                Transition::Added(liked(3)),
                Transition::Removed(liked(2)),
                Transition::Removed(liked(8)),
            ],
        );

        let ids: Vec<i32> = items.iter().map(|item| item.product_id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_from_toggle_flag() {
        assert_eq!(ChangeOrigin::from_toggle(true), ChangeOrigin::Toggle);
        assert_eq!(ChangeOrigin::from_toggle(false), ChangeOrigin::Refresh);
    }

    #[test]
    fn test_reconciled_preserves_other_entries() {
        let items = vec![WishlistItem::from(&liked(1)), WishlistItem::from(&liked(2))];
        let updated = reconciled(&items, &[liked(1)], ChangeOrigin::Toggle);

        assert_eq!(updated, vec![WishlistItem::from(&liked(2))]);
        assert_eq!(items.len(), 2);
    }
}
