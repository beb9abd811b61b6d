//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (catalog)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (Supabase reachable)
//!
//! # Products
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add product
//! POST /cart/update            - Set quantity
//! POST /cart/increment         - Quantity + 1
//! POST /cart/decrement         - Quantity - 1, not below 1
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/events            - Cart count badge (server-sent events)
//!
//! # Checkout
//! GET  /checkout               - Checkout form and order summary
//! POST /checkout               - Submit order
//!
//! # Auth (form posts rate limited)
//! GET  /auth/login             - Sign-in page
//! POST /auth/login             - Sign in
//! GET  /auth/register          - Sign-up page
//! POST /auth/register          - Sign up
//! POST /auth/logout            - Sign out
//! GET  /auth/forgot-password   - Password reset request page
//! POST /auth/forgot-password   - Send reset email
//! GET  /auth/reset-password    - New password page
//! POST /auth/reset-password    - Set new password
//!
//! # Account (requires auth)
//! GET  /account                - Profile page
//! POST /account                - Save profile
//! POST /account/avatar         - Upload avatar (multipart)
//! POST /account/resend-verification - Resend confirmation email
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod layout;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::StorefrontConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Room for multipart boundaries and headers around the avatar bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body cap for avatar uploads.
const fn avatar_body_limit(avatar_max_bytes: usize) -> usize {
    avatar_max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
}

/// Create the auth routes router.
///
/// Form posts that reach the identity provider share one rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page)
                .merge(post(auth::forgot_password).layer(limiter.clone())),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).merge(post(auth::reset_password).layer(limiter)),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create the account routes router.
pub fn account_routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(account::index).post(account::update))
        .route(
            "/avatar",
            post(account::upload_avatar)
                .layer(DefaultBodyLimit::max(avatar_body_limit(config.avatar_max_bytes))),
        )
        .route("/resend-verification", post(account::resend_verification))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_body_limit_adds_multipart_overhead() {
        assert_eq!(avatar_body_limit(1024), 1024 + 64 * 1024);
    }

    #[test]
    fn test_avatar_body_limit_saturates() {
        assert_eq!(avatar_body_limit(usize::MAX), usize::MAX);
        assert_eq!(avatar_body_limit(usize::MAX - 1), usize::MAX);
    }
}
