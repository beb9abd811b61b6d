//! Session-related types.
//!
//! Everything the storefront keeps per visitor lives in the session under
//! one of the [`keys`]: the cart id, the signed-in user and pending flash
//! notifications.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use souq_core::UserId;

use crate::supabase::AuthSession;

/// Seconds before expiry at which an access token is treated as expired.
const EXPIRY_LEEWAY_SECONDS: i64 = 60;

/// Session-stored user identity and provider tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Provider-issued user id.
    pub id: UserId,
    /// Email address the user signed in with.
    pub email: String,
    /// Display name from sign-up metadata.
    pub name: Option<String>,
    /// Bearer token for calls made on the user's behalf.
    pub access_token: String,
    /// Token used to renew `access_token`.
    pub refresh_token: String,
    /// Unix timestamp at which `access_token` expires.
    pub expires_at: i64,
}

impl CurrentUser {
    /// Build the session identity from a freshly issued provider session.
    #[must_use]
    pub fn from_auth_session(session: &AuthSession) -> Self {
        Self {
            id: session.user.id.clone(),
            email: session.user.email.clone().unwrap_or_default(),
            name: session.user.display_name().map(str::to_owned),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at(),
        }
    }

    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at - EXPIRY_LEEWAY_SECONDS
    }

    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the visitor's cart id.
    pub const CART_ID: &str = "cart_id";

    /// Key for pending flash notifications.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(expires_at: i64) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            email: "layla@example.com".to_string(),
            name: None,
            access_token: "access-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_is_expired_uses_leeway() {
        let now = Utc::now().timestamp();
        assert!(user(now - 10).is_expired());
        assert!(user(now + 30).is_expired());
        assert!(!user(now + 3600).is_expired());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut current = user(0);
        assert_eq!(current.display_name(), "layla@example.com");
        current.name = Some("Layla".to_string());
        assert_eq!(current.display_name(), "Layla");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", user(0));
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_from_auth_session() {
        let json = r#"{"access_token":"at","refresh_token":"rt","expires_in":3600,
            "expires_at":1700000000,
            "user":{"id":"u1","email":"layla@example.com","created_at":"2024-03-01T10:15:00Z",
                    "user_metadata":{"name":"Layla"}}}"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        let current = CurrentUser::from_auth_session(&session);

        assert_eq!(current.id.as_str(), "u1");
        assert_eq!(current.name.as_deref(), Some("Layla"));
        assert_eq!(current.expires_at, 1_700_000_000);
    }
}
