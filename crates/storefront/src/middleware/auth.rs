//! Authentication extractors.
//!
//! The signed-in user lives in the session as a [`CurrentUser`]. Pages that
//! need it use [`RequireAuth`], which also renews an expired access token
//! with the stored refresh token before the handler runs.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, Flash, push_flash, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, or the session can no longer be renewed, the
/// request is redirected to the sign-in page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but missing.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the sign-in page.
    RedirectToLogin,
    /// The session layer is not installed.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        if !user.is_expired() {
            return Ok(Self(user));
        }

        match state.supabase().refresh_session(&user.refresh_token).await {
            Ok(renewed) => {
                let user = CurrentUser::from_auth_session(&renewed);
                if let Err(e) = set_current_user(&session, &user).await {
                    tracing::error!(error = %e, "Failed to store renewed session");
                }
                tracing::debug!(user_id = %user.id, "Access token renewed");
                Ok(Self(user))
            }
            Err(e) => {
                tracing::info!(user_id = %user.id, error = %e, "Session renewal failed");
                let _ = clear_current_user(&session).await;
                let _ = push_flash(
                    &session,
                    Flash::error("Session expired").with_description("Please sign in again."),
                )
                .await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(())
}

/// Remove the signed-in user from the session (sign-out).
///
/// The cart id is kept, so the visitor's cart survives signing out.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    clear_sentry_user();
    Ok(())
}
