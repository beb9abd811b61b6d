//! End-to-end tests for the Souq storefront.
//!
//! The tests in `tests/` drive a running storefront over HTTP with a
//! cookie-keeping client, the way a browser would. They are `#[ignore]`d so
//! that `cargo test` stays offline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p souq-storefront &
//! cargo test -p souq-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` selects the server (default `http://localhost:3000`).
//! The account tests also need `SOUQ_TEST_EMAIL` and `SOUQ_TEST_PASSWORD`
//! for a confirmed user in the configured Supabase project.

use reqwest::{Client, redirect};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Absolute URL for a storefront path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", storefront_base_url())
}

/// A client that keeps the session cookie and follows redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
#[must_use]
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A client that keeps the session cookie but stops at redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
#[must_use]
pub fn browser_without_redirects() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Credentials of a confirmed test account, if configured.
#[must_use]
pub fn test_account() -> Option<(String, String)> {
    let email = std::env::var("SOUQ_TEST_EMAIL").ok()?;
    let password = std::env::var("SOUQ_TEST_PASSWORD").ok()?;
    Some((email, password))
}
