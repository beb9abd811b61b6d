//! In-memory cart state.
//!
//! Each visitor owns one [`CartStore`]: the single mutable container for their
//! [`Cart`](souq_core::Cart). Display surfaces (navbar badge, cart page,
//! checkout summary, the live badge feed) only ever read snapshots or
//! subscribe; all writes go through the store's four operations.
//!
//! Stores are kept in a [`CartRegistry`] keyed by a [`CartId`] held in the
//! visitor's session. Nothing here is persisted: a restart or an idle
//! eviction discards the cart.

mod registry;
mod store;

pub use registry::{CartId, CartRegistry};
pub use store::{CartStore, QuantityStep};
