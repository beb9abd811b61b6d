//! Cart route handlers.
//!
//! Mutations are plain form posts answered with a redirect back to the page
//! the visitor came from. Cart ids are stored in the session and mapped to
//! in-memory [`CartStore`](crate::cart::CartStore)s.
//!
//! Cart operations never show an error: unknown lines are ignored and a
//! rejected quantity is logged and leaves the cart as it was.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{
        Redirect,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
};
use futures::{StreamExt, stream, stream::BoxStream};
use serde::Deserialize;
use souq_core::{Cart, CartError, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::{Layout, safe_return_path};
use crate::cart::QuantityStep;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Name of the server-sent event carrying the badge count.
pub const CART_COUNT_EVENT: &str = "cart-count";

/// Cart item display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|line| CartItemView {
                    id: line.id.to_string(),
                    name: line.name.clone(),
                    category: line.category.clone(),
                    image: line.image.clone(),
                    quantity: line.quantity,
                    price: line.price.display(),
                    line_total: line.line_total().display(),
                })
                .collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
///
/// Quantities arrive as raw text: a cleared number input submits an empty
/// string, which must reach the handler instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    pub return_to: Option<String>,
}

/// Set quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
}

/// Form data naming a single cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Log a rejected cart operation; the visitor sees the unchanged cart.
fn log_rejected(result: std::result::Result<bool, CartError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Cart operation rejected");
    }
}

/// Parse a submitted quantity field.
///
/// `Ok(None)` means the field was missing or blank.
fn parse_quantity(raw: Option<&str>) -> std::result::Result<Option<u32>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| text.to_string()),
    }
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
) -> CartShowTemplate {
    let cart = match state.existing_cart(&session).await {
        Some(store) => CartView::from(&store.snapshot()),
        None => CartView::from(&Cart::new()),
    };

    CartShowTemplate { layout, cart }
}

/// Add a catalog product to the cart.
///
/// A blank quantity means one; descriptive fields are copied from the
/// catalog. Quantities that are not a positive whole number leave the cart
/// unchanged.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let id = ProductId::new(form.product_id);
    let product = state
        .catalog()
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let return_to = safe_return_path(form.return_to.as_deref(), "/cart");

    let quantity = match parse_quantity(form.quantity.as_deref()) {
        Ok(quantity) => quantity.unwrap_or(1),
        Err(raw) => {
            tracing::warn!(product_id = %id, quantity = %raw, "Cart operation rejected");
            return Ok(Redirect::to(&return_to));
        }
    };

    let cart = state.cart_for(&session).await?;
    match cart.add_item(product.to_cart_item(quantity)) {
        Ok(()) => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
            tracing::debug!(product_id = %id, count = cart.item_count(), "Added to cart");
        }
        Err(e) => tracing::warn!(error = %e, "Cart operation rejected"),
    }

    Ok(Redirect::to(&return_to))
}

/// Set the quantity of a cart line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Redirect {
    let id = ProductId::new(form.product_id);
    if let Some(cart) = state.existing_cart(&session).await {
        match parse_quantity(form.quantity.as_deref()) {
            Ok(Some(quantity)) => log_rejected(cart.update_quantity(&id, quantity)),
            Ok(None) => tracing::warn!(product_id = %id, "Cart operation rejected: no quantity"),
            Err(raw) => {
                tracing::warn!(product_id = %id, quantity = %raw, "Cart operation rejected");
            }
        }
    }

    Redirect::to("/cart")
}

/// Increase a line's quantity by one.
#[instrument(skip(state, session))]
pub async fn increment(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Redirect {
    if let Some(cart) = state.existing_cart(&session).await {
        log_rejected(cart.step_quantity(&ProductId::new(form.product_id), QuantityStep::Up));
    }
    Redirect::to("/cart")
}

/// Decrease a line's quantity by one, stopping at one.
#[instrument(skip(state, session))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Redirect {
    if let Some(cart) = state.existing_cart(&session).await {
        log_rejected(cart.step_quantity(&ProductId::new(form.product_id), QuantityStep::Down));
    }
    Redirect::to("/cart")
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Redirect {
    if let Some(cart) = state.existing_cart(&session).await {
        cart.remove_item(&ProductId::new(form.product_id));
    }
    Redirect::to("/cart")
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(State(state): State<AppState>, session: Session) -> Redirect {
    if let Some(cart) = state.existing_cart(&session).await {
        cart.clear();
    }
    Redirect::to("/cart")
}

/// Get cart count badge fragment.
#[instrument(skip_all)]
pub async fn count(State(state): State<AppState>, session: Session) -> CartCountTemplate {
    let count = match state.existing_cart(&session).await {
        Some(cart) => cart.item_count(),
        None => 0,
    };

    CartCountTemplate { count }
}

/// Live badge feed.
///
/// Sends the current count immediately, then one event after every change
/// to the visitor's cart. The stream ends if the cart is evicted.
///
/// Visitors without a cart get a single zero and an idle stream; the feed
/// never creates a session or a cart.
#[instrument(skip_all)]
pub async fn events(
    State(state): State<AppState>,
    session: Session,
) -> Sse<KeepAliveStream<BoxStream<'static, std::result::Result<Event, Infallible>>>> {
    let stream = match state.existing_cart(&session).await {
        Some(cart) => {
            let rx = cart.subscribe();
            let initial = rx.borrow().item_count();

            let updates = stream::unfold(rx, |mut rx| async move {
                rx.changed().await.ok()?;
                let count = rx.borrow_and_update().item_count();
                Some((count_event(count), rx))
            });
            stream::once(async move { count_event(initial) })
                .chain(updates)
                .boxed()
        }
        None => stream::once(async { count_event(0) })
            .chain(stream::pending())
            .boxed(),
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn count_event(count: u64) -> std::result::Result<Event, Infallible> {
    Ok(Event::default()
        .event(CART_COUNT_EVENT)
        .data(count.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souq_core::Price;

    use super::*;

    #[test]
    fn test_cart_view_formats_prices() {
        let mut cart = Cart::new();
        cart.add_item(souq_core::CartItem {
            id: ProductId::new("1"),
            name: "Minimalist Watch".to_string(),
            description: String::new(),
            image: String::new(),
            category: "Accessories".to_string(),
            price: Price::parse("199.99").unwrap(),
            quantity: 1,
        })
        .unwrap();
        cart.add_item(souq_core::CartItem {
            id: ProductId::new("2"),
            name: "Wireless Earbuds".to_string(),
            description: String::new(),
            image: String::new(),
            category: "Electronics".to_string(),
            price: Price::parse("159.99").unwrap(),
            quantity: 2,
        })
        .unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.total, "$519.97");
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items.last().unwrap().line_total, "$319.98");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None), Ok(None));
        assert_eq!(parse_quantity(Some("")), Ok(None));
        assert_eq!(parse_quantity(Some("  ")), Ok(None));
        assert_eq!(parse_quantity(Some(" 3 ")), Ok(Some(3)));
        assert_eq!(parse_quantity(Some("0")), Ok(Some(0)));
        assert_eq!(parse_quantity(Some("-2")), Err("-2".to_string()));
        assert_eq!(parse_quantity(Some("two")), Err("two".to_string()));
        assert_eq!(parse_quantity(Some("99999999999")), Err("99999999999".to_string()));
    }

    #[test]
    fn test_count_fragment_renders_number() {
        let html = CartCountTemplate { count: 4 }.render().unwrap();
        assert!(html.contains('4'));
    }
}
