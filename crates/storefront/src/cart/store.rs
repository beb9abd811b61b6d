//! The per-visitor cart store.

use std::sync::Arc;

use souq_core::{Cart, CartError, CartItem, Price, ProductId};
use tokio::sync::watch;

/// Direction for [`CartStore::step_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityStep {
    /// One more of the item.
    Up,
    /// One fewer, never below one.
    Down,
}

/// Shared, cheaply cloneable handle to one visitor's cart.
///
/// Every mutation runs inside `watch::Sender::send_if_modified`, which holds
/// the channel's write lock for the whole transition: concurrent requests for
/// the same cart are serialized and readers only see complete snapshots.
/// Subscribers are woken after each mutation that actually changed the cart;
/// no-ops (absent ids, rejected quantities) are silent.
#[derive(Debug, Clone)]
pub struct CartStore {
    tx: Arc<watch::Sender<Cart>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create a store holding an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(Cart::new())),
        }
    }

    /// Add an item, accumulating quantity onto an existing line.
    ///
    /// # Errors
    ///
    /// Returns the [`CartError`] from the aggregate; the cart is unchanged.
    pub fn add_item(&self, item: CartItem) -> Result<(), CartError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|cart| match cart.add_item(item) {
            Ok(()) => true,
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }

    /// Remove the line for `id`. Returns `false` if there was none.
    pub fn remove_item(&self, id: &ProductId) -> bool {
        self.tx
            .send_if_modified(|cart| cart.remove_item(id).is_some())
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Returns `Ok(false)` if no line matches.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn update_quantity(&self, id: &ProductId, quantity: u32) -> Result<bool, CartError> {
        let mut result = Ok(false);
        self.tx.send_if_modified(|cart| {
            result = cart.update_quantity(id, quantity);
            matches!(result, Ok(true))
        });
        result
    }

    /// Move the quantity of the line for `id` one step, atomically.
    ///
    /// Stepping down from one is refused and reported as `Ok(false)`, as is
    /// an absent id.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] when stepping up from the
    /// largest representable quantity.
    pub fn step_quantity(&self, id: &ProductId, step: QuantityStep) -> Result<bool, CartError> {
        let mut result = Ok(false);
        self.tx.send_if_modified(|cart| {
            let Some(current) = cart.get(id).map(|line| line.quantity) else {
                return false;
            };
            let next = match step {
                QuantityStep::Up => current
                    .checked_add(1)
                    .ok_or_else(|| CartError::QuantityOverflow { id: id.clone() }),
                QuantityStep::Down if current > 1 => Ok(current - 1),
                QuantityStep::Down => return false,
            };
            result = next.and_then(|quantity| cart.update_quantity(id, quantity));
            matches!(result, Ok(true))
        });
        result
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.tx.send_if_modified(|cart| {
            let had_items = !cart.is_empty();
            cart.clear();
            had_items
        });
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.tx.borrow().clone()
    }

    /// Sum of quantities in the current cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.tx.borrow().item_count()
    }

    /// Total price of the current cart.
    #[must_use]
    pub fn total(&self) -> Price {
        self.tx.borrow().total()
    }

    /// Subscribe to cart changes.
    ///
    /// The receiver starts with the current cart marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, cents: u32, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            image: String::new(),
            category: "Electronics".to_string(),
            price: Price::from_cents(cents),
            quantity,
        }
    }

    #[test]
    fn test_operations_update_snapshot() {
        let store = CartStore::new();
        store.add_item(item("1", 1_000, 2)).unwrap();
        store.add_item(item("1", 1_000, 3)).unwrap();
        store.add_item(item("2", 250, 1)).unwrap();

        let cart = store.snapshot();
        assert_eq!(cart.len(), 2);
        assert_eq!(store.item_count(), 6);
        assert_eq!(store.total(), Price::parse("52.50").unwrap());

        assert!(store.update_quantity(&ProductId::new("2"), 4).unwrap());
        assert!(store.remove_item(&ProductId::new("1")));
        assert_eq!(store.total(), Price::from_cents(1_000));

        store.clear();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = CartStore::new();
        let navbar = store.clone();
        store.add_item(item("1", 100, 1)).unwrap();
        assert_eq!(navbar.item_count(), 1);
    }

    #[test]
    fn test_subscribers_see_changes_but_not_noops() {
        let store = CartStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        assert!(!store.remove_item(&ProductId::new("missing")));
        assert!(!store.update_quantity(&ProductId::new("missing"), 3).unwrap());
        assert!(store.add_item(item("1", 100, 0)).is_err());
        store.clear();
        assert!(!rx.has_changed().unwrap());

        store.add_item(item("1", 100, 2)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().item_count(), 2);
    }

    #[test]
    fn test_rejected_update_leaves_cart_unchanged() {
        let store = CartStore::new();
        store.add_item(item("1", 100, 2)).unwrap();

        assert!(store.update_quantity(&ProductId::new("1"), 0).is_err());
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_step_quantity_never_goes_below_one() {
        let store = CartStore::new();
        let id = ProductId::new("1");
        store.add_item(item("1", 100, 2)).unwrap();

        assert!(store.step_quantity(&id, QuantityStep::Up).unwrap());
        assert_eq!(store.snapshot().get(&id).unwrap().quantity, 3);

        assert!(store.step_quantity(&id, QuantityStep::Down).unwrap());
        assert!(store.step_quantity(&id, QuantityStep::Down).unwrap());
        assert!(!store.step_quantity(&id, QuantityStep::Down).unwrap());
        assert_eq!(store.snapshot().get(&id).unwrap().quantity, 1);

        assert!(!store.step_quantity(&ProductId::new("missing"), QuantityStep::Up).unwrap());
    }

    #[test]
    fn test_step_up_overflow_is_rejected() {
        let store = CartStore::new();
        let id = ProductId::new("1");
        store.add_item(item("1", 100, u32::MAX)).unwrap();

        assert!(matches!(
            store.step_quantity(&id, QuantityStep::Up),
            Err(CartError::QuantityOverflow { .. })
        ));
        assert_eq!(store.snapshot().get(&id).unwrap().quantity, u32::MAX);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_serialized() {
        let store = CartStore::new();

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let id = (i % 4).to_string();
                    store.add_item(item(&id, 100, 1)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let cart = store.snapshot();
        assert_eq!(cart.len(), 4);
        assert!(cart.items().iter().all(|line| line.quantity == 16));
        assert_eq!(store.item_count(), 64);
    }
}
