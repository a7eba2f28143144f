use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ALBUM_TITLE_MAX;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Album {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// Album row with the counts the album index shows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlbumStats {
    pub id: Uuid,
    pub title: String,
    pub is_favorite: bool,
    pub photo_count: i64,
    pub video_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub title: String,
    pub is_favorite: bool,
    pub photo_count: i64,
    pub video_count: i64,
    pub previews: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameAlbumRequest {
    pub new_title: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumTitleRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteToggleResponse {
    pub title: String,
    pub status: String,
}

/// Where an upload batch should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumSelector {
    Existing(String),
    Create(String),
}

impl AlbumSelector {
    /// A non-blank `new_album` wins over `album`; both blank means no album.
    pub fn from_form(album: Option<&str>, new_album: Option<&str>) -> Result<Option<Self>, AppError> {
        let new_album = new_album.map(str::trim).filter(|s| !s.is_empty());
        let album = album.map(str::trim).filter(|s| !s.is_empty());

        match (new_album, album) {
            (Some(title), _) => Ok(Some(AlbumSelector::Create(validate_album_title(title)?))),
            (None, Some(title)) => Ok(Some(AlbumSelector::Existing(validate_album_title(title)?))),
            (None, None) => Ok(None),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            AlbumSelector::Existing(title) | AlbumSelector::Create(title) => title,
        }
    }
}

pub fn validate_album_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::invalid_field("title", "Album name cannot be empty"));
    }
    if title.chars().count() > ALBUM_TITLE_MAX {
        return Err(AppError::invalid_field(
            "title",
            format!("Album name must be at most {} characters", ALBUM_TITLE_MAX),
        ));
    }
    Ok(title.to_string())
}
