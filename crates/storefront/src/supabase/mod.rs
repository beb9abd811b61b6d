//! Supabase client for identity, profiles and avatar storage.
//!
//! Thin typed wrappers over the hosted REST endpoints:
//!
//! - `auth/v1` (GoTrue): sign-up, password sign-in, refresh, sign-out,
//!   password recovery and confirmation emails
//! - `rest/v1` (PostgREST): the `profiles` table
//! - `storage/v1`: public avatar bucket
//!
//! Every call makes a single attempt and returns `Result<T, SupabaseError>`.
//! Provider error bodies are reduced to their human-readable message so
//! handlers can show it verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use souq_storefront::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//! let session = client.sign_in_with_password(&email, &password).await?;
//! let profile = client.get_profile(&session.user.id, &session.access_token).await?;
//! ```

mod auth;
mod profiles;
mod storage;
mod types;

pub use storage::avatar_path;
pub use types::*;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A header value could not be built.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl SupabaseError {
    /// Returns `true` if the provider rejected the credentials or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }

    /// Message suitable for a notification.
    ///
    /// Provider messages are passed through unchanged; transport faults get
    /// a generic description.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Http(_) => "Could not reach the account service. Please try again.".to_string(),
            Self::Parse(_) | Self::InvalidHeader(_) => {
                "The account service returned an unexpected response.".to_string()
            }
        }
    }
}

/// Client for the Supabase project configured for this storefront.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    avatar_bucket: String,
    profiles_table: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("avatar_bucket", &self.inner.avatar_bucket)
            .field("profiles_table", &self.inner.profiles_table)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| SupabaseError::InvalidHeader(format!("anon key: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("souq-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                avatar_bucket: config.avatar_bucket.clone(),
                profiles_table: config.profiles_table.clone(),
            }),
        })
    }

    /// Build a URL below the project root from path segments.
    ///
    /// Segments are percent-encoded individually.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, SupabaseError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SupabaseError::Parse("Supabase URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Bearer value for calls made on behalf of a user, or the anon role.
    fn bearer(&self, access_token: Option<&str>) -> String {
        let token = access_token.unwrap_or_else(|| self.inner.anon_key.expose_secret());
        format!("Bearer {token}")
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let response = check_status(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
    }

    /// Send a request whose success body is ignored.
    async fn send_empty(request: reqwest::RequestBuilder) -> Result<(), SupabaseError> {
        check_status(request.send().await?).await?;
        Ok(())
    }

    /// Check that the auth service answers at all.
    ///
    /// # Errors
    ///
    /// Returns error if the health endpoint is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), SupabaseError> {
        let url = self.endpoint(["auth", "v1", "health"])?;
        Self::send_empty(self.inner.client.get(url)).await
    }
}

/// Turn an error status into [`SupabaseError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    tracing::debug!(status = status.as_u16(), %message, "Supabase request failed");

    Err(SupabaseError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extract the human-readable message from a provider error body.
///
/// The services disagree on the field name: GoTrue uses `msg` or
/// `error_description`, PostgREST and storage use `message`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .into_iter()
        .find_map(|key| {
            value
                .get(key)?
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&test_config().supabase).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = client().endpoint(["auth", "v1", "signup"]).unwrap();
        assert_eq!(url.as_str(), "https://project.supabase.test/auth/v1/signup");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = client()
            .endpoint(["storage", "v1", "object", "avatars", "a b.png"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.supabase.test/storage/v1/object/avatars/a%20b.png"
        );
    }

    #[test]
    fn test_bearer_defaults_to_anon_key() {
        let client = client();
        assert!(client.bearer(None).contains("test-anon-key"));
        assert_eq!(client.bearer(Some("user-token")), "Bearer user-token");
    }

    #[test]
    fn test_error_message_field_precedence() {
        assert_eq!(
            error_message(r#"{"code":400,"msg":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#)
                .as_deref(),
            Some("Email not confirmed")
        );
        assert_eq!(
            error_message(r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#)
                .as_deref(),
            Some("The resource already exists")
        );
        assert_eq!(error_message(r#"{"error":"invalid_grant"}"#).as_deref(), Some("invalid_grant"));
    }

    #[test]
    fn test_error_message_ignores_non_json_and_blank() {
        assert!(error_message("<html>Bad Gateway</html>").is_none());
        assert!(error_message(r#"{"msg":"  "}"#).is_none());
    }

    #[test]
    fn test_user_message_passes_provider_text_through() {
        let err = SupabaseError::Api {
            status: 422,
            message: "User already registered".to_string(),
        };
        assert_eq!(err.user_message(), "User already registered");
        assert!(!err.is_unauthorized());

        let err = SupabaseError::Api {
            status: 401,
            message: "invalid JWT".to_string(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_debug_omits_key() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("test-anon-key"));
        assert!(debug.contains("project.supabase.test"));
    }
}
