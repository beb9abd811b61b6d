//! Account status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the identity provider has confirmed the account's email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Sign-up confirmation link not followed yet.
    #[default]
    Unconfirmed,
    /// Email address confirmed.
    Confirmed,
}

impl AccountStatus {
    /// Derive the status from the provider's `email_confirmed_at` timestamp.
    #[must_use]
    pub const fn from_confirmed_at(confirmed_at: Option<&DateTime<Utc>>) -> Self {
        match confirmed_at {
            Some(_) => Self::Confirmed,
            None => Self::Unconfirmed,
        }
    }

    /// Human-readable label for the profile page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "Active",
            Self::Unconfirmed => "Not activated",
        }
    }

    /// Returns `true` if the account is confirmed.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}
