//! Profile edits for the signed-in user.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::backend::{BackendError, BackendService, ImageUpload, ProfileUpdate, User};
use crate::error::add_breadcrumb;
use crate::store::AuthStore;

/// Errors that can occur when editing a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The new name is empty after trimming.
    #[error("Name cannot be empty")]
    EmptyName,

    /// No user is signed in.
    #[error("No user is signed in")]
    NotSignedIn,

    /// Reading the image failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Rename the signed-in user and publish the updated record.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the name is blank, or the
/// backend rejects the update.
#[instrument(skip(backend, auth))]
pub async fn save_name<B: BackendService>(
    backend: &B,
    auth: &AuthStore,
    name: &str,
) -> Result<User, ProfileError> {
    let user = auth.user().ok_or(ProfileError::NotSignedIn)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::EmptyName);
    }

    let updated = backend
        .update_profile(&user.id, &ProfileUpdate::name(name))
        .await?;
    add_breadcrumb("profile", "Name updated", None);
    auth.set_user(updated.clone());
    Ok(updated)
}

/// Upload an image file as the signed-in user's avatar.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the file cannot be read, or a
/// backend call fails.
#[instrument(skip(backend, auth))]
pub async fn upload_avatar<B: BackendService>(
    backend: &B,
    auth: &AuthStore,
    path: &Path,
) -> Result<User, ProfileError> {
    let user = auth.user().ok_or(ProfileError::NotSignedIn)?;

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or_else(
            || format!("avatar_{}.jpg", chrono::Utc::now().timestamp_millis()),
            str::to_owned,
        );
    let upload = ImageUpload::new(file_name, bytes);
    debug!(content_type = upload.content_type, size = upload.bytes.len(), "Uploading avatar");

    let url = backend.upload_image(upload).await?;
    let updated = backend
        .update_profile(&user.id, &ProfileUpdate::avatar(url.as_str()))
        .await?;
    add_breadcrumb("profile", "Avatar updated", None);
    auth.set_user(updated.clone());
    Ok(updated)
}
