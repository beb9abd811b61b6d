//! Router test helpers.

pub mod fake_supabase;

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use crate::catalog::Catalog;
use crate::config::{CartConfig, StorefrontConfig, SupabaseConfig};
use crate::state::AppState;

/// Configuration pointing at an unreachable Supabase project.
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        supabase: SupabaseConfig {
            url: Url::parse("https://project.supabase.test").unwrap(),
            anon_key: SecretString::from("test-anon-key-Zq7vR2mK9xLp4TnW"),
            avatar_bucket: "avatars".to_string(),
            profiles_table: "profiles".to_string(),
        },
        cart: CartConfig::default(),
        catalog_path: None,
        avatar_max_bytes: 1024,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A router over the built-in catalog.
pub fn test_app(config: StorefrontConfig) -> axum::Router {
    let state = AppState::new(config, Catalog::builtin()).unwrap();
    crate::app(state).unwrap()
}

/// A `GET` request, optionally carrying a session cookie.
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri).header("x-forwarded-for", "203.0.113.7");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// A form `POST`, optionally carrying a session cookie.
pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "203.0.113.7");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send one request through a clone of the router.
pub async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// The `name=value` pair of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("souq_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

/// The `Location` header of a redirect.
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
