use std::path::Path;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{CONVERTED_EXTENSIONS, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies an extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Lowercased extension of a user-supplied filename.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn needs_conversion(ext: &str) -> bool {
    CONVERTED_EXTENSIONS.contains(&ext)
}

/// `abc123.mp4` -> `abc123.jpg`
pub fn thumbnail_name_for(storage_filename: &str) -> String {
    let stem = Path::new(storage_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(storage_filename);
    format!("{}.jpg", stem)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub album_id: Option<Uuid>,
    pub storage_filename: String,
    pub original_filename: String,
    pub media_kind: MediaKind,
    pub thumbnail_filename: Option<String>,
    pub uploader_alias: String,
    pub upload_seq: i64,
    pub created_at: DateTime<Utc>,
}

/// Photo row joined with its album title, as the gallery reads it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub album_id: Option<Uuid>,
    pub album_title: Option<String>,
    pub storage_filename: String,
    pub original_filename: String,
    pub media_kind: MediaKind,
    pub thumbnail_filename: Option<String>,
    pub uploader_alias: String,
    pub upload_seq: i64,
    pub created_at: DateTime<Utc>,
}

/// One row of an upload batch. Owner and album are shared by the batch.
#[derive(Debug, Clone)]
pub struct PhotoInsert {
    pub storage_filename: String,
    pub original_filename: String,
    pub media_kind: MediaKind,
    pub thumbnail_filename: Option<String>,
    pub uploader_alias: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

/// Multipart body of `POST /upload`.
#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    #[multipart(rename = "photos")]
    pub photos: Vec<TempFile>,

    pub album: Option<Text<String>>,

    pub new_album: Option<Text<String>>,

    /// Set when a delegate uploads into someone else's gallery.
    pub owner_id: Option<Text<String>>,
}
