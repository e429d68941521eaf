use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Period;
use crate::state::AppState;

/// Photo attached to a submission form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

/// Object stored for a submission, kept so a failed insert can remove it.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub key: String,
    pub url: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

fn ext_from_name(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `<user_id>/<year>/<month>-<attempt>.<ext>`. The attempt id is fresh on
/// every call so two uploads for one period never share an object.
pub fn photo_key(user_id: Uuid, period: Period, photo: &PhotoUpload) -> String {
    let ext = photo
        .file_name
        .as_deref()
        .and_then(ext_from_name)
        .or_else(|| ext_from_mime(&photo.content_type).map(str::to_string))
        .unwrap_or_else(|| "bin".into());
    format!(
        "{}/{}/{}-{}.{}",
        user_id,
        period.year,
        period.month,
        Uuid::new_v4(),
        ext
    )
}

pub async fn upload(
    st: &AppState,
    user_id: Uuid,
    period: Period,
    photo: PhotoUpload,
) -> anyhow::Result<StoredPhoto> {
    let key = photo_key(user_id, period, &photo);
    st.storage
        .put_object(&key, photo.body, &photo.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    let url = st.storage.public_url(&key);
    info!(%user_id, key = %key, "certificate photo uploaded");
    Ok(StoredPhoto { key, url })
}

/// Best effort; a leftover object is only logged.
pub async fn discard(st: &AppState, photo: &StoredPhoto) {
    if let Err(e) = st.storage.delete_object(&photo.key).await {
        warn!(error = %e, key = %photo.key, "failed to remove orphaned photo");
    }
}
