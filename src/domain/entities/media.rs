use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::album::Album;
use super::photo::{MediaKind, PhotoRecord};
use super::shared_access::GrantView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub author_alias: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Description, tags and comments attached to one photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoMetadata {
    pub description: String,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
}

pub type MetadataMap = HashMap<Uuid, PhotoMetadata>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaView {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub media_kind: MediaKind,
    pub album: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub uploader_alias: String,
    pub url: String,
    pub download_url: String,
    pub thumb: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MediaView {
    /// `viewer_is_owner` controls whether media URLs carry the `owner_id` query.
    pub fn build(record: PhotoRecord, metadata: PhotoMetadata, viewer_is_owner: bool) -> Self {
        let links = MediaLinks::new(record.user_id, viewer_is_owner);
        let url = links.upload(&record.storage_filename);
        let thumb = match record.media_kind {
            MediaKind::Image => Some(url.clone()),
            MediaKind::Video => record
                .thumbnail_filename
                .as_deref()
                .map(|name| links.thumbnail(name)),
        };

        MediaView {
            id: record.id,
            download_url: links.download(&record.storage_filename),
            url,
            thumb,
            filename: record.storage_filename,
            original_filename: record.original_filename,
            media_kind: record.media_kind,
            album: record.album_title,
            description: metadata.description,
            tags: metadata.tags,
            comments: metadata.comments,
            uploader_alias: record.uploader_alias,
            created_at: record.created_at,
        }
    }
}

/// Builds the media URLs for one gallery.
#[derive(Debug, Clone, Copy)]
pub struct MediaLinks {
    owner_id: Uuid,
    qualify: bool,
}

impl MediaLinks {
    pub fn new(owner_id: Uuid, viewer_is_owner: bool) -> Self {
        MediaLinks { owner_id, qualify: !viewer_is_owner }
    }

    pub fn upload(&self, filename: &str) -> String {
        self.link("/uploads", filename)
    }

    pub fn thumbnail(&self, filename: &str) -> String {
        self.link("/thumbnails", filename)
    }

    pub fn download(&self, filename: &str) -> String {
        self.link("/download", filename)
    }

    fn link(&self, prefix: &str, filename: &str) -> String {
        let encoded = urlencoding::encode(filename);
        if self.qualify {
            format!("{}/{}?owner_id={}", prefix, encoded, self.owner_id)
        } else {
            format!("{}/{}", prefix, encoded)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    pub owner_id: Option<Uuid>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// `?owner_id=` on media and listing routes; absent means the caller's own gallery.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub filename: String,
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameTagRequest {
    pub filename: String,
    pub old_tag: String,
    pub new_tag: String,
}

#[derive(Debug, Deserialize)]
pub struct GlobalRenameTagRequest {
    pub old_tag: String,
    pub new_tag: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
    pub owner_id: Option<Uuid>,
}

/// Normalized tag/search filters. Both are lowercased; blank means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilters {
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl GalleryFilters {
    pub fn new(tag: Option<&str>, search: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
        };
        GalleryFilters {
            tag: clean(tag),
            search: clean(search),
        }
    }

    /// Tag is exact membership; search is a substring over filename,
    /// description, album title and every tag. The two axes are ANDed.
    pub fn matches(&self, filename: &str, album: Option<&str>, metadata: &PhotoMetadata) -> bool {
        if let Some(tag) = &self.tag {
            if !metadata.tags.iter().any(|t| t.to_lowercase() == *tag) {
                return false;
            }
        }

        if let Some(needle) = &self.search {
            let hit = filename.to_lowercase().contains(needle)
                || metadata.description.to_lowercase().contains(needle)
                || album.is_some_and(|a| a.to_lowercase().contains(needle))
                || metadata.tags.iter().any(|t| t.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryPage {
    pub owner_id: Uuid,
    pub items: Vec<MediaView>,
    pub all_tags: Vec<String>,
    pub current_tag: Option<String>,
    pub search_query: Option<String>,
    pub shared_with_me: Vec<GrantView>,
    pub favorite_albums: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlbumPage {
    pub title: String,
    pub is_favorite: bool,
    pub items: Vec<MediaView>,
}

impl AlbumPage {
    pub fn new(album: Album, items: Vec<MediaView>) -> Self {
        AlbumPage {
            title: album.title,
            is_favorite: album.is_favorite,
            items,
        }
    }
}
