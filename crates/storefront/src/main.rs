//! Souq Storefront - Public e-commerce site.
//!
//! This binary serves the storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with plain form posts and a server-sent events badge
//! - Askama templates for server-side rendering
//! - In-memory carts and sessions (nothing survives a restart)
//! - Supabase for authentication, profiles and avatar storage
//!
//! # Security
//!
//! This binary only holds the Supabase anon key. Every user-scoped call is
//! made with the signed-in user's access token, so row-level security in the
//! Supabase project decides what each user can read and write.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use sentry::integrations::tracing as sentry_tracing;
use souq_storefront::catalog::Catalog;
use souq_storefront::config::StorefrontConfig;
use souq_storefront::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Load the catalog file if one is configured, else the built-in products.
fn load_catalog(config: &StorefrontConfig) -> Catalog {
    match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::load(path).expect("Failed to load catalog");
            tracing::info!(path = %path.display(), products = catalog.products().len(), "Catalog loaded");
            catalog
        }
        None => Catalog::builtin(),
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "souq_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let catalog = load_catalog(&config);
    let state = AppState::new(config.clone(), catalog)
        .expect("Failed to initialize application state");

    let app = souq_storefront::app(state).expect("Failed to build router");

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses key the auth rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
