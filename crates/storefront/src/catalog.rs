//! Product catalog.
//!
//! The catalog is read-only for the life of the process. It is either the
//! built-in featured list or a JSON array of products loaded at startup:
//!
//! ```json
//! [
//!   {
//!     "id": "1",
//!     "name": "Minimalist Watch",
//!     "description": "Elegant timepiece with a clean, modern design",
//!     "price": "199.99",
//!     "image": "https://images.unsplash.com/photo-1524805444758-089113d48a6d",
//!     "category": "Accessories"
//!   }
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;

use souq_core::{Price, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid product list.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two products share an id.
    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),
}

/// The products on sale, in display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from a product list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// The featured products shipped with the storefront.
    #[must_use]
    pub fn builtin() -> Self {
        let product = |id: &str, name: &str, description: &str, cents: u32, image: &str, category: &str| Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            price: Price::from_cents(cents),
            image: image.to_string(),
            category: category.to_string(),
        };

        Self {
            products: vec![
                product(
                    "1",
                    "Minimalist Watch",
                    "Elegant timepiece with a clean, modern design",
                    19_999,
                    "https://images.unsplash.com/photo-1524805444758-089113d48a6d",
                    "Accessories",
                ),
                product(
                    "2",
                    "Wireless Earbuds",
                    "Premium sound quality with noise cancellation",
                    15_999,
                    "https://images.unsplash.com/photo-1590658268037-6bf12165a8df",
                    "Electronics",
                ),
                product(
                    "3",
                    "Leather Wallet",
                    "Handcrafted from genuine leather",
                    7_999,
                    "https://images.unsplash.com/photo-1627123424574-724758594e93",
                    "Accessories",
                ),
                product(
                    "4",
                    "Smart Speaker",
                    "Voice-controlled with premium sound",
                    12_999,
                    "https://images.unsplash.com/photo-1589492477829-5e65395b66cc",
                    "Electronics",
                ),
            ],
        }
    }

    /// Parse a catalog from a JSON product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or ids repeat.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// All products in display order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }
}
