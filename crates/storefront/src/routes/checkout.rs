//! Checkout route handlers.
//!
//! The checkout page shows an order summary read from the cart next to the
//! contact and card form. Submitting records the order in the logs and shows
//! a confirmation; no payment is taken.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use souq_core::{Cart, Email};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use super::layout::Layout;
use crate::error::Result;
use crate::filters;
use crate::models::{Flash, push_flash};
use crate::state::AppState;

/// Order summary line for templates.
#[derive(Debug, Clone)]
pub struct SummaryLineView {
    pub name: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Order summary for templates.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub lines: Vec<SummaryLineView>,
    pub total: String,
}

impl From<&Cart> for SummaryView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .map(|line| SummaryLineView {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    line_total: line.line_total().display(),
                })
                .collect(),
            total: cart.total().display(),
        }
    }
}

/// Checkout form data.
#[derive(Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl std::fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl CheckoutForm {
    /// Check that every field was filled in and the email parses.
    fn validate(&self) -> std::result::Result<Email, String> {
        let required = [
            ("Full name", &self.name),
            ("Phone number", &self.phone),
            ("Address", &self.address),
            ("Card number", &self.card_number),
            ("Expiry date", &self.expiry_date),
            ("CVV", &self.cvv),
        ];
        if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(format!("{label} is required."));
        }

        Email::parse(&self.email).map_err(|e| e.to_string())
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub summary: SummaryView,
    pub email: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub layout: Layout,
    pub reference: String,
    pub name: String,
    pub email: String,
    pub summary: SummaryView,
}

/// Display the checkout page.
///
/// The email field is prefilled for signed-in users.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
) -> CheckoutTemplate {
    let cart = match state.existing_cart(&session).await {
        Some(store) => store.snapshot(),
        None => Cart::new(),
    };
    let email = layout
        .user
        .as_ref()
        .map(|user| user.email.clone())
        .unwrap_or_default();

    CheckoutTemplate {
        layout,
        summary: SummaryView::from(&cart),
        email,
    }
}

/// Submit the checkout form.
///
/// The cart is left as it is unless `STOREFRONT_CLEAR_CART_ON_CHECKOUT` is
/// set.
#[instrument(skip(state, session, layout, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(cart) = state.existing_cart(&session).await.filter(|c| c.item_count() > 0) else {
        push_flash(&session, Flash::error("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart").into_response());
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => {
            push_flash(
                &session,
                Flash::error("Checkout failed").with_description(message),
            )
            .await?;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    let snapshot = cart.snapshot();
    let reference = Uuid::new_v4().simple().to_string();
    tracing::info!(
        order_ref = %reference,
        lines = snapshot.len(),
        item_count = snapshot.item_count(),
        total = %snapshot.total(),
        "Order submitted"
    );

    if state.config().cart.clear_on_checkout {
        cart.clear();
        layout.item_count = 0;
    }

    Ok(ConfirmationTemplate {
        layout,
        reference,
        name: form.name.trim().to_string(),
        email: email.to_string(),
        summary: SummaryView::from(&snapshot),
    }
    .into_response())
}
