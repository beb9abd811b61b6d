//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::layout::{Layout, ProductView};
use crate::filters;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductView>,
}

/// Display the home page with the featured products.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let products = state
        .catalog()
        .products()
        .iter()
        .map(ProductView::from)
        .collect();

    HomeTemplate { layout, products }
}
