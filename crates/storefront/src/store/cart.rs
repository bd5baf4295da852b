//! Cart reconciliation.
//!
//! Merges a batch of product-state changes into the cart's line items.
//! Quantity alone decides the outcome: a positive quantity adds or updates
//! the line, zero removes it.

use cartkit_core::{CartLineItem, ProductState};

use super::{Reconciliation, Transition};

/// Apply `changes` to `items` in input order.
///
/// For each changed product:
/// - absent, quantity > 0: append a new line ([`Transition::Added`])
/// - present, quantity > 0: replace the line in place
/// - present, quantity == 0: remove the line ([`Transition::Removed`])
/// - absent, quantity == 0: nothing
pub fn reconcile(items: &mut Vec<CartLineItem>, changes: &[ProductState]) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for product in changes {
        let position = items
            .iter()
            .position(|line| line.product_id == product.id);

        match (position, product.in_cart()) {
            (None, true) => {
                items.push(CartLineItem::from(product));
                outcome.record(Transition::Added(product.clone()));
            }
            (Some(index), true) => {
                let updated = CartLineItem::from(product);
                if let Some(existing) = items.get_mut(index)
                    && *existing != updated
                {
                    *existing = updated;
                    outcome.changed = true;
                }
            }
            (Some(index), false) => {
                items.remove(index);
                outcome.record(Transition::Removed(product.clone()));
            }
            (None, false) => {}
        }
    }

    outcome
}

/// Value-returning form of [`reconcile`]: the updated list, leaving the input untouched.
#[must_use]
pub fn reconciled(items: &[CartLineItem], changes: &[ProductState]) -> Vec<CartLineItem> {
    let mut updated = items.to_vec();
    reconcile(&mut updated, changes);
    updated
}

/// Total number of units across all lines (the cart badge count).
#[must_use]
pub fn total_quantity(items: &[CartLineItem]) -> u64 {
    items.iter().map(|line| u64::from(line.quantity)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cartkit_core::ProductId;
    use rust_decimal::Decimal;

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
    fn test_add_to_empty_cart() {
        let product = ProductState {
            id: ProductId::new(7),
            current_cart_quantity: 2,
            sku: "A".to_string(),
            subtotal: Decimal::new(10, 0),
            ..ProductState::default()
        };

        let mut items = Vec::new();
        let outcome = reconcile(&mut items, &[product.clone()]);

        assert_eq!(items, vec![line(7, 2)]);
        assert!(outcome.changed);
        assert_eq!(outcome.transitions, vec![Transition::Added(product)]);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut items = vec![line(7, 2)];
        let outcome = reconcile(&mut items, &[ProductState::with_quantity(7, 0)]);

        assert!(items.is_empty());
        assert!(matches!(
            outcome.transitions.as_slice(),
            [Transition::Removed(p)] if p.id == ProductId::new(7)
        ));
    }

    #[test]
    fn test_quantity_change_keeps_position() {
        let mut items = vec![line(1, 1), line(7, 2), line(9, 4)];
        let outcome = reconcile(&mut items, &[ProductState::with_quantity(7, 5)]);

        assert_eq!(items, vec![line(1, 1), line(7, 5), line(9, 4)]);
        assert!(outcome.changed);
        assert!(outcome.transitions.is_empty());
    }

    #[test]
    fn test_absent_product_with_zero_quantity_is_noop() {
        let mut items = vec![line(1, 1)];
        let outcome = reconcile(&mut items, &[ProductState::with_quantity(42, 0)]);

        assert_eq!(items, vec![line(1, 1)]);
        assert!(!outcome.changed);
        assert!(outcome.transitions.is_empty());
    }

    #[test]
    fn test_identical_update_reports_unchanged() {
        let mut items = vec![line(7, 2)];
        let outcome = reconcile(&mut items, &[ProductState::with_quantity(7, 2)]);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_update_copies_all_line_fields() {
        let mut items = vec![line(7, 2)];
        let product = ProductState {
            id: ProductId::new(7),
            current_cart_quantity: 3,
            buying_by_secondary: true,
            selected_option: Some("Box of 12".to_string()),
            picture_url: "https://cdn.test/7.png".to_string(),
            ..ProductState::default()
        };
        reconcile(&mut items, &[product]);

        assert!(items[0].buying_by_secondary);
        assert_eq!(items[0].selected_option.as_deref(), Some("Box of 12"));
        assert_eq!(items[0].picture_url, "https://cdn.test/7.png");
    }

    #[test]
    fn test_changes_apply_in_input_order() {
        // Add then remove in the same batch leaves nothing behind but both transitions.
        let mut items = Vec::new();
        let outcome = reconcile(
            &mut items,
            &[
                ProductState::with_quantity(3, 1),
                ProductState::with_quantity(3, 0),
            ],
        );

        assert!(items.is_empty());
        assert_eq!(outcome.transitions.len(), 2);
        assert!(matches!(outcome.transitions[0], Transition::Added(_)));
        assert!(matches!(outcome.transitions[1], Transition::Removed(_)));
    }

    #[test]
    fn test_repeated_ids_in_batch_stay_unique() {
        let mut items = Vec::new();
        reconcile(
            &mut items,
            &[
                ProductState::with_quantity(3, 1),
                ProductState::with_quantity(3, 4),
            ],
        );
        assert_eq!(items, vec![line(3, 4)]);
    }

    #[test]
    fn test_reconciled_leaves_input_untouched() {
        let items = vec![line(7, 2)];
        let updated = reconciled(&items, &[ProductState::with_quantity(8, 1)]);

        assert_eq!(items, vec![line(7, 2)]);
        assert_eq!(updated, vec![line(7, 2), line(8, 1)]);
    }

    #[test]
    fn test_total_quantity() {
        assert_eq!(total_quantity(&[]), 0);
        assert_eq!(total_quantity(&[line(1, 2), line(2, 5)]), 7);
    }
}
