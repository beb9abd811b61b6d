//! Registry of live carts, keyed by the id stored in each visitor's session.

use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CartStore;

/// Upper bound on carts held in memory at once.
const MAX_CARTS: u64 = 100_000;

/// Identifier of a visitor's cart, stored in their session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(Uuid);

impl CartId {
    /// Generate a fresh random cart id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// In-memory map from [`CartId`] to [`CartStore`].
///
/// Carts untouched for the idle timeout are evicted, which is also what
/// bounds memory for abandoned sessions.
#[derive(Clone)]
pub struct CartRegistry {
    carts: Cache<CartId, CartStore>,
}

impl CartRegistry {
    /// Create a registry that evicts carts idle for `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(MAX_CARTS)
            .time_to_idle(idle_timeout)
            .build();
        Self { carts }
    }

    /// The store for `id`, if it is still live.
    pub async fn get(&self, id: &CartId) -> Option<CartStore> {
        self.carts.get(id).await
    }

    /// The store for `id`, creating an empty one if needed.
    pub async fn get_or_create(&self, id: CartId) -> CartStore {
        self.carts.get_with(id, async { CartStore::new() }).await
    }
}
