//! Avatar storage calls (`/storage/v1`).

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use souq_core::UserId;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use super::{SupabaseClient, SupabaseError, UploadedObject};

/// Object path for a new avatar: `{user_id}-{random}.{ext}`.
///
/// The extension is taken from the uploaded file name, falling back to
/// `bin` when there is none.
#[must_use]
pub fn avatar_path(user_id: &UserId, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!("{user_id}-{}.{ext}", Uuid::new_v4().simple())
}

impl SupabaseClient {
    /// Upload an avatar image to the configured bucket.
    ///
    /// Returns the object's public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the upload is rejected (for example a duplicate path
    /// or a bucket policy violation) or the request fails.
    #[instrument(skip(self, bytes, access_token), fields(size = bytes.len()))]
    pub async fn upload_avatar(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
        access_token: &str,
    ) -> Result<Url, SupabaseError> {
        let bucket = self.inner.avatar_bucket.as_str();
        let url = self.endpoint(
            ["storage", "v1", "object", bucket]
                .into_iter()
                .chain(path.split('/')),
        )?;

        let uploaded: UploadedObject = Self::send_json(
            self.inner
                .client
                .post(url)
                .header(AUTHORIZATION, self.bearer(Some(access_token)))
                .header(CONTENT_TYPE, content_type)
                .header("x-upsert", "false")
                .body(bytes),
        )
        .await?;

        tracing::info!(key = %uploaded.key, "Avatar uploaded");

        self.public_url(path)
    }

    /// Public URL of an object in the avatar bucket.
    ///
    /// # Errors
    ///
    /// Returns error only if the project URL cannot hold a path.
    pub fn public_url(&self, path: &str) -> Result<Url, SupabaseError> {
        let bucket = self.inner.avatar_bucket.as_str();
        self.endpoint(
            ["storage", "v1", "object", "public", bucket]
                .into_iter()
                .chain(path.split('/')),
        )
    }
}
