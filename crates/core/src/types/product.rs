//! Catalog product.

use serde::{Deserialize, Serialize};

use crate::types::cart::CartItem;
use crate::types::id::ProductId;
use crate::types::price::Price;

/// A product offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short marketing description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Category label (e.g. "Accessories").
    pub category: String,
}

impl Product {
    /// Build a cart line for this product.
    ///
    /// Descriptive fields are copied now; the cart never re-reads the catalog.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity,
        }
    }
}
