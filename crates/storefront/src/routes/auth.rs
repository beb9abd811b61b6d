//! Authentication route handlers.
//!
//! Handles sign-in, sign-up, sign-out and password recovery against the
//! Supabase identity service. Every form post redirects; outcomes are shown
//! as flash notifications carrying the provider's message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use souq_core::Email;
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use crate::error::Result;
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, Flash, push_flash};
use crate::state::AppState;
use crate::supabase::{ProfileUpdate, SignUpOutcome};

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Password reset request form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// New password form data.
#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub token_hash: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query carried by the emailed reset link.
#[derive(Debug, Deserialize)]
pub struct ResetLinkQuery {
    pub token_hash: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
}

/// Password reset request page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub layout: Layout,
}

/// New password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub layout: Layout,
    pub token_hash: String,
}

/// Flash an error and redirect.
async fn fail(session: &Session, title: &str, description: String, to: &str) -> Result<Response> {
    push_flash(session, Flash::error(title).with_description(description)).await?;
    Ok(Redirect::to(to).into_response())
}

// =============================================================================
// Sign-in
// =============================================================================

/// Display the sign-in page.
pub async fn login_page(layout: Layout) -> Response {
    if layout.user.is_some() {
        return Redirect::to("/account").into_response();
    }
    LoginTemplate { layout }.into_response()
}

/// Handle sign-in form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return fail(&session, "Sign-in failed", e.to_string(), "/auth/login").await,
    };

    match state
        .supabase()
        .sign_in_with_password(email.as_str(), &form.password)
        .await
    {
        Ok(auth) => {
            let user = CurrentUser::from_auth_session(&auth);
            set_current_user(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User signed in");
            push_flash(&session, Flash::success("Signed in")).await?;
            Ok(Redirect::to("/account").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            fail(&session, "Sign-in failed", e.user_message(), "/auth/login").await
        }
    }
}

// =============================================================================
// Sign-up
// =============================================================================

/// Display the sign-up page.
pub async fn register_page(layout: Layout) -> Response {
    if layout.user.is_some() {
        return Redirect::to("/account").into_response();
    }
    RegisterTemplate { layout }.into_response()
}

/// Handle sign-up form submission.
///
/// When the project confirms emails, the user is told to check their inbox.
/// When it signs users in immediately, the session is stored and the profile
/// row is seeded with the display name.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    const PAGE: &str = "/auth/register";
    const TITLE: &str = "Sign-up failed";

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return fail(&session, TITLE, e.to_string(), PAGE).await,
    };
    if form.password != form.password_confirm {
        return fail(&session, TITLE, "Passwords do not match.".to_string(), PAGE).await;
    }
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let outcome = match state
        .supabase()
        .sign_up(email.as_str(), &form.password, name)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            return fail(&session, TITLE, e.user_message(), PAGE).await;
        }
    };

    match outcome {
        SignUpOutcome::Session(auth) => {
            let user = CurrentUser::from_auth_session(&auth);
            set_current_user(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User registered and signed in");

            if let Some(name) = name {
                let seed = ProfileUpdate {
                    id: user.id.clone(),
                    name: Some(name.to_string()),
                    phone: None,
                    avatar_url: None,
                    updated_at: chrono::Utc::now(),
                };
                if let Err(e) = state
                    .supabase()
                    .upsert_profile(&seed, &user.access_token)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to seed profile");
                }
            }

            push_flash(&session, Flash::success("Account created")).await?;
            Ok(Redirect::to("/account").into_response())
        }
        SignUpOutcome::ConfirmationRequired(user) => {
            tracing::info!(user_id = %user.id, "User registered, confirmation pending");
            push_flash(
                &session,
                Flash::success("Check your email")
                    .with_description(format!("We sent a confirmation link to {email}.")),
            )
            .await?;
            Ok(Redirect::to("/auth/login").into_response())
        }
    }
}

// =============================================================================
// Sign-out
// =============================================================================

/// Sign out and revoke the provider session.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Ok(Some(user)) = session
        .get::<CurrentUser>(crate::models::session_keys::CURRENT_USER)
        .await
    {
        if let Err(e) = state.supabase().sign_out(&user.access_token).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
        tracing::info!(user_id = %user.id, "User signed out");
    }

    clear_current_user(&session).await?;
    push_flash(&session, Flash::success("Signed out")).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset request page.
pub async fn forgot_password_page(layout: Layout) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate { layout }
}

/// Handle password reset request.
///
/// The emailed link points back at `/auth/reset-password`.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    const PAGE: &str = "/auth/forgot-password";
    const TITLE: &str = "Reset failed";

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return fail(&session, TITLE, e.to_string(), PAGE).await,
    };

    let redirect_to = format!(
        "{}/auth/reset-password",
        state.config().base_url.trim_end_matches('/')
    );
    if let Err(e) = state
        .supabase()
        .reset_password_for_email(email.as_str(), &redirect_to)
        .await
    {
        tracing::warn!(error = %e, "Password recovery request failed");
        return fail(&session, TITLE, e.user_message(), PAGE).await;
    }

    push_flash(
        &session,
        Flash::success("Check your email")
            .with_description("If an account exists for that address, a reset link is on its way."),
    )
    .await?;
    Ok(Redirect::to(PAGE).into_response())
}

/// Display the new password page.
///
/// Reached from the emailed link, which carries `token_hash`.
pub async fn reset_password_page(
    session: Session,
    layout: Layout,
    Query(query): Query<ResetLinkQuery>,
) -> Result<Response> {
    match query.token_hash.filter(|token| !token.is_empty()) {
        Some(token_hash) => Ok(ResetPasswordTemplate { layout, token_hash }.into_response()),
        None => {
            fail(
                &session,
                "Invalid reset link",
                "Request a new password reset email.".to_string(),
                "/auth/forgot-password",
            )
            .await
        }
    }
}

/// Handle new password submission.
///
/// Verifies the recovery token, sets the new password and signs the user in.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    const TITLE: &str = "Password reset failed";

    if form.password != form.password_confirm {
        let back = format!(
            "/auth/reset-password?token_hash={}",
            urlencoding::encode(&form.token_hash)
        );
        return fail(&session, TITLE, "Passwords do not match.".to_string(), &back).await;
    }

    let auth = match state.supabase().verify_recovery(&form.token_hash).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, "Recovery token rejected");
            return fail(&session, TITLE, e.user_message(), "/auth/forgot-password").await;
        }
    };

    if let Err(e) = state
        .supabase()
        .update_password(&auth.access_token, &form.password)
        .await
    {
        tracing::warn!(error = %e, "Password update failed");
        return fail(&session, TITLE, e.user_message(), "/auth/forgot-password").await;
    }

    let user = CurrentUser::from_auth_session(&auth);
    set_current_user(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Password reset");
    push_flash(&session, Flash::success("Password updated")).await?;
    Ok(Redirect::to("/account").into_response())
}
