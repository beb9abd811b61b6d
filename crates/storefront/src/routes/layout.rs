//! Data shared by every full page: navbar badge, sign-in state and flashes.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use souq_core::Product;
use tower_sessions::Session;

use crate::models::{CurrentUser, Flash, session_keys, take_flashes};
use crate::state::AppState;

/// Page chrome extracted for full-page handlers.
///
/// Extracting a `Layout` consumes pending flashes, so only handlers that
/// render a page should take one.
#[derive(Debug, Default)]
pub struct Layout {
    /// Sum of quantities in the visitor's cart.
    pub item_count: u64,
    /// The signed-in user, if any.
    pub user: Option<CurrentUser>,
    /// Notifications queued by the previous request.
    pub flashes: Vec<Flash>,
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self::default());
        };

        let item_count = match state.existing_cart(&session).await {
            Some(cart) => cart.item_count(),
            None => 0,
        };
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flashes = take_flashes(&session).await;

        Ok(Self {
            item_count,
            user,
            flashes,
        })
    }
}

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            category: product.category.clone(),
        }
    }
}

/// Accept only same-site relative paths as redirect targets.
#[must_use]
pub fn safe_return_path(candidate: Option<&str>, fallback: &'static str) -> String {
    candidate
        .filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .unwrap_or(fallback)
        .to_string()
}
