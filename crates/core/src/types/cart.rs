//! Shopping cart aggregate.
//!
//! The cart is an ordered list of line items, unique by product id. Every
//! operation is a pure transition of that list:
//!
//! - [`Cart::add_item`] appends a new line, or accumulates the quantity of an
//!   existing line (the existing line's descriptive fields win).
//! - [`Cart::remove_item`] drops a line; absent ids are a no-op.
//! - [`Cart::update_quantity`] sets a line's quantity; absent ids are a no-op.
//! - [`Cart::clear`] empties the cart.
//!
//! Quantities are bounded here and nowhere else: zero is rejected by both
//! `add_item` and `update_quantity`, and negative values cannot be expressed.
//! A rejected call leaves the cart untouched.
//!
//! Totals are derived on read and never stored.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// Errors from cart operations. The cart is unchanged when one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("quantity for {id} must be at least 1")]
    InvalidQuantity {
        /// Product the quantity was meant for.
        id: ProductId,
    },
    /// Accumulated quantity would not fit in a `u32`.
    #[error("quantity for {id} is too large")]
    QuantityOverflow {
        /// Product whose quantity overflowed.
        id: ProductId,
    },
}

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier, unique within a cart.
    pub id: ProductId,
    /// Product name at the time it was added.
    pub name: String,
    /// Product description at the time it was added.
    pub description: String,
    /// Image URL at the time it was added.
    pub image: String,
    /// Category at the time it was added.
    pub category: String,
    /// Unit price at the time it was added.
    pub price: Price,
    /// Units requested (at least 1).
    pub quantity: u32,
}

impl CartItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The cart aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `item.quantity` is zero and
    /// [`CartError::QuantityOverflow`] if the merged quantity overflows.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity { id: item.id });
        }

        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(CartError::QuantityOverflow { id: item.id })?;
            }
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Remove the line for `id`, returning it if it was present.
    pub fn remove_item(&mut self, id: &ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|line| &line.id == id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Returns `Ok(false)` when no line matches (the cart is unchanged).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is zero.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { id: id.clone() });
        }

        match self.items.iter_mut().find(|line| &line.id == id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines (the navbar badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
