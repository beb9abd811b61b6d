//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use souq_core::ProductId;
use tracing::instrument;

use super::layout::{Layout, ProductView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
}

/// Display a product detail page.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    add_breadcrumb("navigation", "Viewed product page", Some(&[("product_id", id.as_str())]));

    Ok(ProductShowTemplate {
        layout,
        product: ProductView::from(product),
    })
}
