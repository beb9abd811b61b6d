//! Account route handlers.
//!
//! These routes require authentication. The profile page combines the
//! identity record (email, confirmation, join date) with the user's row in
//! the `profiles` table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::supabase::{AuthUser, Profile, ProfileUpdate, avatar_path};

/// Placeholder avatar service (initials on a coloured background).
const AVATAR_PLACEHOLDER_URL: &str = "https://api.dicebear.com/7.x/initials/svg";

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "avatar";

/// Profile display data for templates.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub avatar_url: String,
    pub initial_seed: String,
    pub status_label: &'static str,
    pub confirmed: bool,
    pub joined: String,
}

impl ProfileView {
    fn new(user: &AuthUser, profile: &Profile) -> Self {
        let email = user.email.clone().unwrap_or_default();
        let name = profile.name.clone().unwrap_or_default();
        let seed = if name.trim().is_empty() {
            email.clone()
        } else {
            name.clone()
        };
        let avatar_url = profile
            .avatar_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| placeholder_avatar_url(&seed));
        let status = user.status();

        Self {
            id: user.id.to_string(),
            email,
            name,
            phone: profile.phone.clone().unwrap_or_default(),
            avatar_url,
            initial_seed: seed,
            status_label: status.label(),
            confirmed: status.is_confirmed(),
            joined: user.created_at.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Initials avatar for users without an uploaded image.
fn placeholder_avatar_url(seed: &str) -> String {
    format!("{AVATAR_PLACEHOLDER_URL}?seed={}", urlencoding::encode(seed))
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
}

/// Display the profile page.
///
/// A user who has never saved a profile sees empty fields.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut layout: Layout,
) -> Result<Response> {
    let auth_user = match state.supabase().get_user(&user.access_token).await {
        Ok(auth_user) => auth_user,
        Err(e) if e.is_unauthorized() => {
            tracing::info!(error = %e, "Stored session rejected");
            clear_current_user(&session).await?;
            push_flash(
                &session,
                Flash::error("Session expired").with_description("Please sign in again."),
            )
            .await?;
            return Ok(Redirect::to("/auth/login").into_response());
        }
        Err(e) => return Err(AppError::Supabase(e)),
    };

    let profile = match state
        .supabase()
        .get_profile(&user.id, &user.access_token)
        .await
    {
        Ok(profile) => profile.unwrap_or_else(|| Profile::empty(user.id.clone())),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile");
            layout.flashes.push(
                Flash::error("Could not load profile").with_description(e.user_message()),
            );
            Profile::empty(user.id.clone())
        }
    };

    Ok(ProfileTemplate {
        profile: ProfileView::new(&auth_user, &profile),
        layout,
    }
    .into_response())
}

/// Save the editable profile fields.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let update = ProfileUpdate::details(
        user.id.clone(),
        form.name.trim().to_string(),
        form.phone.trim().to_string(),
    );

    let flash = match state
        .supabase()
        .upsert_profile(&update, &user.access_token)
        .await
    {
        Ok(_) => Flash::success("Profile updated"),
        Err(e) => {
            tracing::warn!(error = %e, "Profile update failed");
            Flash::error("Profile update failed").with_description(e.user_message())
        }
    };

    push_flash(&session, flash).await?;
    Ok(Redirect::to("/account"))
}

/// An avatar image read from the upload form.
struct AvatarUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Read the avatar field, checking type and size.
async fn read_avatar(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> std::result::Result<AvatarUpload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| e.body_text())?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err("Please choose an image file.".to_string());
        }

        let bytes = field.bytes().await.map_err(|e| e.body_text())?;
        if bytes.is_empty() {
            return Err("Please choose an image file.".to_string());
        }
        if bytes.len() > max_bytes {
            return Err(format!(
                "Images must be at most {} KiB.",
                max_bytes / 1024
            ));
        }

        return Ok(AvatarUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err("Please choose an image file.".to_string())
}

/// Upload a new avatar and store its public URL on the profile.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut multipart: Multipart,
) -> Result<Redirect> {
    const TITLE: &str = "Avatar upload failed";

    let upload = match read_avatar(&mut multipart, state.config().avatar_max_bytes).await {
        Ok(upload) => upload,
        Err(message) => {
            push_flash(&session, Flash::error(TITLE).with_description(message)).await?;
            return Ok(Redirect::to("/account"));
        }
    };

    let path = avatar_path(&user.id, &upload.file_name);
    let result = async {
        let url = state
            .supabase()
            .upload_avatar(&path, &upload.content_type, upload.bytes, &user.access_token)
            .await?;
        state
            .supabase()
            .upsert_profile(
                &ProfileUpdate::avatar(user.id.clone(), url.to_string()),
                &user.access_token,
            )
            .await
    }
    .await;

    let flash = match result {
        Ok(_) => Flash::success("Avatar uploaded"),
        Err(e) => {
            tracing::warn!(error = %e, "Avatar upload failed");
            Flash::error(TITLE).with_description(e.user_message())
        }
    };

    push_flash(&session, flash).await?;
    Ok(Redirect::to("/account"))
}

/// Resend the sign-up confirmation email.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn resend_verification(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let flash = match state
        .supabase()
        .resend_signup_confirmation(&user.email)
        .await
    {
        Ok(()) => Flash::success("Verification email sent")
            .with_description("Please check your inbox."),
        Err(e) => {
            tracing::warn!(error = %e, "Resending verification failed");
            Flash::error("Could not resend verification").with_description(e.user_message())
        }
    };

    push_flash(&session, flash).await?;
    Ok(Redirect::to("/account"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souq_core::UserId;

    use super::*;

    fn auth_user(confirmed: bool) -> AuthUser {
        let json = format!(
            r#"{{"id":"u1","email":"layla@example.com","created_at":"2024-03-01T10:15:00Z",
                "email_confirmed_at":{}}}"#,
            if confirmed { "\"2024-03-02T08:00:00Z\"" } else { "null" }
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_empty_profile_uses_placeholder_seeded_with_email() {
        let view = ProfileView::new(&auth_user(false), &Profile::empty(UserId::new("u1")));

        assert_eq!(view.name, "");
        assert_eq!(view.phone, "");
        assert_eq!(
            view.avatar_url,
            "https://api.dicebear.com/7.x/initials/svg?seed=layla%40example.com"
        );
        assert_eq!(view.status_label, "Not activated");
        assert!(!view.confirmed);
        assert_eq!(view.joined, "March 1, 2024");
    }

    #[test]
    fn test_saved_profile_prefers_uploaded_avatar() {
        let profile = Profile {
            id: UserId::new("u1"),
            name: Some("Layla".to_string()),
            phone: Some("+966500000000".to_string()),
            avatar_url: Some("https://project.supabase.test/a.png".to_string()),
            updated_at: None,
        };
        let view = ProfileView::new(&auth_user(true), &profile);

        assert_eq!(view.avatar_url, "https://project.supabase.test/a.png");
        assert_eq!(view.initial_seed, "Layla");
        assert!(view.confirmed);
        assert_eq!(view.status_label, "Active");
    }

    #[test]
    fn test_named_profile_without_avatar_seeds_placeholder_with_name() {
        let profile = Profile {
            name: Some("Layla Hassan".to_string()),
            ..Profile::empty(UserId::new("u1"))
        };
        let view = ProfileView::new(&auth_user(true), &profile);
        assert!(view.avatar_url.ends_with("?seed=Layla%20Hassan"));
    }
}
