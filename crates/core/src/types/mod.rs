//! Core types for Souq.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{Cart, CartError, CartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::Product;
pub use status::AccountStatus;
