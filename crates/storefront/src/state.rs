//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::cart::{CartId, CartRegistry, CartStore};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::models::session_keys;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the Supabase client, the catalog and the live carts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    supabase: SupabaseClient,
    catalog: Catalog,
    carts: CartRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built.
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let carts = CartRegistry::new(config.cart.idle_timeout);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                catalog,
                carts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }

    /// The visitor's cart, creating it (and its session entry) if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn cart_for(
        &self,
        session: &Session,
    ) -> Result<CartStore, tower_sessions::session::Error> {
        let id = match session.get::<CartId>(session_keys::CART_ID).await? {
            Some(id) => id,
            None => {
                let id = CartId::generate();
                session.insert(session_keys::CART_ID, id).await?;
                tracing::debug!(cart_id = %id, "Cart created");
                id
            }
        };

        Ok(self.inner.carts.get_or_create(id).await)
    }

    /// The visitor's cart if one exists.
    ///
    /// Never creates a cart; read-only surfaces treat `None` as empty.
    pub async fn existing_cart(&self, session: &Session) -> Option<CartStore> {
        let id = session
            .get::<CartId>(session_keys::CART_ID)
            .await
            .ok()
            .flatten()?;
        self.inner.carts.get(&id).await
    }
}
