//! Souq Core - Shared domain types.
//!
//! This crate provides the types used across the Souq components:
//! - `storefront` - Public-facing web store (catalog, cart, checkout, account)
//! - `integration-tests` - End-to-end tests against a running storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! HTTP clients, no async runtime. The cart aggregate lives here so its
//! invariants can be tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails, the catalog
//!   product, account status, and the cart aggregate

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
