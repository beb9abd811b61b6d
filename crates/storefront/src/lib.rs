//! Souq storefront library.
//!
//! Catalog, cart, checkout and account pages backed by Supabase. The binary
//! in `main.rs` loads configuration and serves [`app`]; tests drive the same
//! router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod supabase;

use axum::{Router, http::header::InvalidHeaderValue};
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{
    SecurityHeaders, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory holding the stylesheet and the badge script.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront router with its middleware stack.
///
/// # Errors
///
/// Returns an error if the Content-Security-Policy built from the
/// configuration is not a valid header value.
pub fn app(state: AppState) -> Result<Router, InvalidHeaderValue> {
    let config = state.config();
    let security = SecurityHeaders::new(config)?;
    let session_layer = create_session_layer(config);

    let router = routes::routes(config)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            security,
            security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    Ok(router)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support;
