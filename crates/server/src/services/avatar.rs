//! Avatar file storage.
//!
//! Uploads land in the upload directory first and are then moved into the
//! public avatar directory as `{user_id}.{ext}`. If anything fails after the
//! scratch file exists, it is removed before the error propagates.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

use phonebook_core::UserId;

use crate::config::StorageConfig;

/// Public URL prefix the avatar directory is served under.
pub const AVATAR_URL_PREFIX: &str = "/avatars";

const DEFAULT_EXTENSION: &str = "png";

/// Errors from storing an avatar.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// The multipart body had no `avatar` field.
    #[error("missing avatar file")]
    MissingFile,

    /// The uploaded part is not declared as an image.
    #[error("avatar must be an image")]
    NotAnImage,

    /// The uploaded part has no content.
    #[error("avatar file is empty")]
    Empty,

    /// Filesystem failure while writing or moving the file.
    #[error("avatar storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    /// Original filename, used only for its extension.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Moves uploaded avatars into the public directory.
#[derive(Debug, Clone)]
pub struct AvatarStorage {
    upload_dir: PathBuf,
    avatar_dir: PathBuf,
}

impl AvatarStorage {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            avatar_dir: config.avatar_dir.clone(),
        }
    }

    /// Directory the public avatar files live in.
    #[must_use]
    pub fn avatar_dir(&self) -> &Path {
        &self.avatar_dir
    }

    /// Store `upload` as the avatar of `user_id` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `AvatarError::NotAnImage` or `AvatarError::Empty` for unusable
    /// uploads and `AvatarError::Io` if the file cannot be written or moved.
    pub async fn store(&self, user_id: UserId, upload: AvatarUpload) -> Result<String, AvatarError> {
        let is_image = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(AvatarError::NotAnImage);
        }
        if upload.bytes.is_empty() {
            return Err(AvatarError::Empty);
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let temp_path = self.upload_dir.join(format!("{}.upload", Uuid::new_v4()));

        let extension = file_extension(upload.file_name.as_deref());
        let file_name = format!("{user_id}.{extension}");
        let destination = self.avatar_dir.join(&file_name);

        let staged = async {
            tokio::fs::write(&temp_path, &upload.bytes).await?;
            self.move_into_place(&temp_path, &destination).await
        }
        .await;
        discard_on_error(&temp_path, staged).await?;

        tracing::info!(user_id = %user_id, file = %file_name, "Avatar stored");
        Ok(format!("{AVATAR_URL_PREFIX}/{file_name}"))
    }

    async fn move_into_place(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.avatar_dir).await?;
        if tokio::fs::rename(from, to).await.is_ok() {
            return Ok(());
        }
        // rename fails across filesystems
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await
    }
}

/// Remove the scratch file when `result` is an error. A partial write counts.
async fn discard_on_error<T>(temp_path: &Path, result: std::io::Result<T>) -> std::io::Result<T> {
    if result.is_err() {
        match tokio::fs::remove_file(temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %temp_path.display(), "Failed to remove temporary upload");
            }
        }
    }
    result
}

/// Lower-cased extension of `file_name`, or `png` when there is no usable one.
fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), str::to_ascii_lowercase)
}
