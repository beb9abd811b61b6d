//! Request and response payloads for the Supabase APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use souq_core::{AccountStatus, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// A user as returned by the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    /// Provider-issued user id.
    pub id: UserId,
    /// Email address, absent for phone-only accounts.
    #[serde(default)]
    pub email: Option<String>,
    /// When the sign-up confirmation link was followed.
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Free-form metadata supplied at sign-up.
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Whether the email address has been confirmed.
    #[must_use]
    pub const fn status(&self) -> AccountStatus {
        AccountStatus::from_confirmed_at(self.email_confirmed_at.as_ref())
    }

    /// Display name from sign-up metadata, if one was given.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// Metadata stored with the user at sign-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Tokens issued on sign-in, refresh or recovery.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Unix timestamp at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Expiry as a Unix timestamp, derived from `expires_in` when the
    /// provider omits `expires_at`.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user.id)
            .finish()
    }
}

/// Result of a sign-up.
///
/// Projects with email confirmation enabled return the bare user; projects
/// with auto-confirm sign the user in immediately.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    /// Signed in immediately.
    Session(AuthSession),
    /// Confirmation email sent.
    ConfirmationRequired(AuthUser),
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ResendRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub token_hash: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordUpdate<'a> {
    pub password: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Profiles
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Blank profile for a user who has never saved one.
    #[must_use]
    pub const fn empty(id: UserId) -> Self {
        Self {
            id,
            name: None,
            phone: None,
            avatar_url: None,
            updated_at: None,
        }
    }
}

/// Upsert payload for the `profiles` table.
///
/// Fields left as `None` are omitted, so an upsert only touches the columns
/// it carries.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileUpdate {
    /// Update of the editable contact fields.
    #[must_use]
    pub fn details(id: UserId, name: String, phone: String) -> Self {
        Self {
            id,
            name: Some(name),
            phone: Some(phone),
            avatar_url: None,
            updated_at: Utc::now(),
        }
    }

    /// Update of the avatar only.
    #[must_use]
    pub fn avatar(id: UserId, avatar_url: String) -> Self {
        Self {
            id,
            name: None,
            phone: None,
            avatar_url: Some(avatar_url),
            updated_at: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// Response to an object upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedObject {
    /// `{bucket}/{path}` of the stored object.
    #[serde(rename = "Key")]
    pub key: String,
}
