//! Identity calls (`/auth/v1`).

use reqwest::header::AUTHORIZATION;
use tracing::instrument;

use super::types::{
    EmailRequest, PasswordGrant, PasswordUpdate, RefreshGrant, ResendRequest, SignUpRequest,
    VerifyRequest,
};
use super::{AuthSession, AuthUser, SignUpOutcome, SupabaseClient, SupabaseError, UserMetadata};

impl SupabaseClient {
    /// Register a new account.
    ///
    /// The display name is stored in the user's metadata.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects the sign-up
    /// (for example an already registered email or a weak password).
    #[instrument(skip(self, password, name))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let url = self.endpoint(["auth", "v1", "signup"])?;
        let body = SignUpRequest {
            email,
            password,
            data: UserMetadata {
                name: name.map(str::to_owned),
            },
        };

        Self::send_json(self.inner.client.post(url).json(&body)).await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        Self::send_json(
            self.inner
                .client
                .post(url)
                .json(&PasswordGrant { email, password }),
        )
        .await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns error if the refresh token is revoked or the request fails.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "token"])?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        Self::send_json(
            self.inner
                .client
                .post(url)
                .json(&RefreshGrant { refresh_token }),
        )
        .await
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(["auth", "v1", "logout"])?;
        Self::send_empty(
            self.inner
                .client
                .post(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token))),
        )
        .await
    }

    /// Fetch the user behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] with status 401 if the token is no
    /// longer valid.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint(["auth", "v1", "user"])?;
        Self::send_json(
            self.inner
                .client
                .get(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token))),
        )
        .await
    }

    /// Send a password reset email.
    ///
    /// The emailed link points at `redirect_to` with a `token_hash` query
    /// parameter.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "recover"])?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        Self::send_empty(self.inner.client.post(url).json(&EmailRequest { email })).await
    }

    /// Exchange a password recovery token for a session.
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn verify_recovery(&self, token_hash: &str) -> Result<AuthSession, SupabaseError> {
        let url = self.endpoint(["auth", "v1", "verify"])?;
        Self::send_json(self.inner.client.post(url).json(&VerifyRequest {
            kind: "recovery",
            token_hash,
        }))
        .await
    }

    /// Set a new password for the user behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid or the password is rejected.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint(["auth", "v1", "user"])?;
        Self::send_json(
            self.inner
                .client
                .put(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token)))
                .json(&PasswordUpdate { password }),
        )
        .await
    }

    /// Resend the sign-up confirmation email.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rate limits it.
    #[instrument(skip(self))]
    pub async fn resend_signup_confirmation(&self, email: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(["auth", "v1", "resend"])?;
        Self::send_empty(self.inner.client.post(url).json(&ResendRequest {
            kind: "signup",
            email,
        }))
        .await
    }
}
