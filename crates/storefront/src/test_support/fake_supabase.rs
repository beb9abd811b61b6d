//! A stand-in Supabase project for router tests.
//!
//! Serves the handful of auth, REST and storage endpoints the storefront
//! calls on a loopback port and records what it was sent.
//!
//! Accounts:
//! - password [`PASSWORD`] signs in with a fresh access token;
//! - password [`STALE_PASSWORD`] signs in with an already expired one, which
//!   only the refresh grant can renew;
//! - anything else is rejected with [`INVALID_CREDENTIALS`].

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::StorefrontConfig;

/// Email of the only account.
pub const EMAIL: &str = "layla@example.com";
/// Password yielding a fresh session.
pub const PASSWORD: &str = "correct-horse";
/// Password yielding an expired session.
pub const STALE_PASSWORD: &str = "stale-horse";
/// Message returned for any other password.
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

const USER_ID: &str = "0b6a3c8e-5d1f-4e2a-9c7b-3f8d2e1a6b40";
const FRESH_TOKEN: &str = "access-fresh";
const RENEWED_TOKEN: &str = "access-renewed";
const STALE_TOKEN: &str = "access-stale";
const REFRESH_TOKEN: &str = "refresh-1";

/// Requests the fake has accepted, in arrival order.
#[derive(Debug, Default)]
pub struct Recorded {
    /// `grant_type` of every token request.
    pub grants: Vec<String>,
    /// Body of every profile upsert.
    pub profile_upserts: Vec<Value>,
    /// Object path of every storage upload.
    pub uploads: Vec<String>,
    /// Body of every confirmation resend.
    pub resends: Vec<Value>,
}

/// Handle to a running fake project.
#[derive(Clone, Debug)]
pub struct FakeSupabase {
    url: Url,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeSupabase {
    /// Serve the fake on an ephemeral loopback port.
    pub async fn spawn() -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let router = Router::new()
            .route("/auth/v1/health", get(health))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/resend", post(resend))
            .route("/rest/v1/profiles", get(profiles).post(upsert_profile))
            .route("/storage/v1/object/{bucket}/{*path}", post(upload))
            .with_state(Arc::clone(&recorded));

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            recorded,
        }
    }

    /// Project URL of the fake.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Test configuration pointing at the fake.
    pub fn config(&self) -> StorefrontConfig {
        let mut config = super::test_config();
        config.supabase.url = self.url.clone();
        config
    }

    /// Inspect the recorded requests.
    pub fn recorded<T>(&self, read: impl FnOnce(&Recorded) -> T) -> T {
        read(&self.recorded.lock().unwrap())
    }
}

type Shared = State<Arc<Mutex<Recorded>>>;

fn user_json() -> Value {
    json!({
        "id": USER_ID,
        "aud": "authenticated",
        "email": EMAIL,
        "email_confirmed_at": null,
        "created_at": "2024-03-01T10:15:00Z",
        "user_metadata": { "name": "Layla" }
    })
}

fn session_json(access_token: &str, expires_at: i64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "refresh_token": REFRESH_TOKEN,
        "expires_in": 3600,
        "expires_at": expires_at,
        "user": user_json()
    })
}

fn api_error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "name": "GoTrue" }))
}

#[derive(Deserialize)]
struct TokenQuery {
    grant_type: String,
}

async fn token(
    State(recorded): Shared,
    Query(query): Query<TokenQuery>,
    Json(body): Json<Value>,
) -> Response {
    recorded.lock().unwrap().grants.push(query.grant_type.clone());
    let now = Utc::now().timestamp();

    match query.grant_type.as_str() {
        "password" => match body["password"].as_str() {
            Some(PASSWORD) => Json(session_json(FRESH_TOKEN, now + 3600)).into_response(),
            Some(STALE_PASSWORD) => Json(session_json(STALE_TOKEN, now - 10)).into_response(),
            _ => api_error(
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_grant", "msg": INVALID_CREDENTIALS }),
            ),
        },
        "refresh_token" if body["refresh_token"] == REFRESH_TOKEN => {
            Json(session_json(RENEWED_TOKEN, now + 3600)).into_response()
        }
        _ => api_error(
            StatusCode::BAD_REQUEST,
            json!({ "error_description": "Invalid Refresh Token" }),
        ),
    }
}

/// Accept only tokens that are still valid.
fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    matches!(bearer, Some(FRESH_TOKEN | RENEWED_TOKEN))
}

fn unauthorized() -> Response {
    api_error(
        StatusCode::UNAUTHORIZED,
        json!({ "msg": "invalid JWT: token is expired" }),
    )
}

async fn user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(user_json()).into_response()
}

async fn resend(State(recorded): Shared, Json(body): Json<Value>) -> Json<Value> {
    recorded.lock().unwrap().resends.push(body);
    Json(json!({}))
}

async fn profiles(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn upsert_profile(
    State(recorded): Shared,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let row = body[0].clone();
    recorded.lock().unwrap().profile_upserts.push(body);
    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn upload(
    State(recorded): Shared,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, json!({ "message": "empty object" }));
    }
    recorded.lock().unwrap().uploads.push(path.clone());
    Json(json!({ "Key": format!("{bucket}/{path}") })).into_response()
}
