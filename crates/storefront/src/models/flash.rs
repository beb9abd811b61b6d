//! One-shot notifications carried across a redirect.
//!
//! Handlers push a [`Flash`] before redirecting; the next rendered page takes
//! and displays every pending flash.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A notification shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub title: String,
    pub description: Option<String>,
}

impl Flash {
    /// A success notification.
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            title: title.into(),
            description: None,
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            title: title.into(),
            description: None,
        }
    }

    /// Attach a description line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Queue a flash for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    flash: Flash,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session.get(keys::FLASH).await?.unwrap_or_default();
    pending.push(flash);
    session.insert(keys::FLASH, pending).await
}

/// Take every pending flash, leaving none behind.
///
/// Session faults are logged and yield no flashes, so a page always renders.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(keys::FLASH).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
