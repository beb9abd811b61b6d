//! Profile table calls (`/rest/v1/{table}`).

use reqwest::header::AUTHORIZATION;
use souq_core::UserId;
use tracing::instrument;
use url::Url;

use super::{Profile, ProfileUpdate, SupabaseClient, SupabaseError};

impl SupabaseClient {
    fn profiles_url(&self) -> Result<Url, SupabaseError> {
        self.endpoint(["rest", "v1", self.inner.profiles_table.as_str()])
    }

    /// Fetch the profile row for `user_id`.
    ///
    /// Returns `Ok(None)` if the user has never saved a profile.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or row-level security rejects the
    /// token.
    #[instrument(skip(self, access_token), fields(user_id = %user_id))]
    pub async fn get_profile(
        &self,
        user_id: &UserId,
        access_token: &str,
    ) -> Result<Option<Profile>, SupabaseError> {
        let mut url = self.profiles_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", "*");

        let rows: Vec<Profile> = Self::send_json(
            self.inner
                .client
                .get(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token))),
        )
        .await?;

        Ok(rows.into_iter().next())
    }

    /// Insert or merge a profile row, keyed by user id.
    ///
    /// Returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the row is rejected.
    #[instrument(skip(self, update, access_token), fields(user_id = %update.id))]
    pub async fn upsert_profile(
        &self,
        update: &ProfileUpdate,
        access_token: &str,
    ) -> Result<Profile, SupabaseError> {
        let url = self.profiles_url()?;

        let rows: Vec<Profile> = Self::send_json(
            self.inner
                .client
                .post(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token)))
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .json(&[update]),
        )
        .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Parse("upsert returned no rows".to_string()))
    }
}
