use crate::constants::ALBUM_PREVIEW_COUNT;
use crate::domain::use_cases::access::Actor;
use crate::domain::use_cases::gallery::assemble_views;
use crate::entities::album::{validate_album_title, Album, AlbumSummary, FavoriteToggleResponse};
use crate::entities::media::{AlbumPage, GalleryFilters, MediaLinks};
use crate::entities::photo::MediaKind;
use crate::errors::AppError;
use crate::repositories::album::AlbumRepository;
use crate::repositories::metadata::MetadataRepository;
use crate::repositories::photo::PhotoRepository;

/// Album management. Albums are only ever touched by their owner.
pub struct AlbumHandler<R, M>
where
    R: AlbumRepository + PhotoRepository,
    M: MetadataRepository,
{
    pub repo: R,
    pub metadata: M,
}

impl<R, M> AlbumHandler<R, M>
where
    R: AlbumRepository + PhotoRepository,
    M: MetadataRepository,
{
    pub fn new(repo: R, metadata: M) -> Self {
        AlbumHandler { repo, metadata }
    }

    pub async fn list_albums(&self, actor: &Actor) -> Result<Vec<AlbumSummary>, AppError> {
        let links = MediaLinks::new(actor.id, true);
        let stats = self.repo.list_albums(&actor.id).await?;

        let mut summaries = Vec::with_capacity(stats.len());
        for album in stats {
            let recent = self
                .repo
                .recent_in_album(&actor.id, &album.id, ALBUM_PREVIEW_COUNT as i64)
                .await?;
            let previews = recent
                .iter()
                .filter_map(|photo| match photo.media_kind {
                    MediaKind::Image => Some(links.upload(&photo.storage_filename)),
                    MediaKind::Video => photo.thumbnail_filename.as_deref().map(|t| links.thumbnail(t)),
                })
                .collect();

            summaries.push(AlbumSummary {
                title: album.title,
                is_favorite: album.is_favorite,
                photo_count: album.photo_count,
                video_count: album.video_count,
                previews,
            });
        }
        Ok(summaries)
    }

    pub async fn view_album(&self, actor: &Actor, title: &str) -> Result<AlbumPage, AppError> {
        let title = title.trim();
        let album = self
            .repo
            .find_album(&actor.id, title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No album found named {}", title)))?;

        let records = self.repo.list_photos(&actor.id, Some(&album.id)).await?;
        let items = assemble_views(&self.metadata, records, true, &GalleryFilters::default()).await?;
        Ok(AlbumPage::new(album, items))
    }

    pub async fn create_album(&self, actor: &Actor, title: &str) -> Result<Album, AppError> {
        let title = validate_album_title(title)?;
        let album = self.repo.create_album(&actor.id, &title).await?;
        tracing::info!(owner_id = %actor.id, album = %album.title, "album created");
        Ok(album)
    }

    pub async fn rename_album(&self, actor: &Actor, title: &str, new_title: &str) -> Result<Album, AppError> {
        let new_title = validate_album_title(new_title)?;
        self.repo.rename_album(&actor.id, title.trim(), &new_title).await
    }

    /// Photos in the album survive with no album.
    pub async fn delete_album(&self, actor: &Actor, title: &str) -> Result<(), AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_field("title", "Missing album title"));
        }
        self.repo.delete_album(&actor.id, title).await?;
        tracing::info!(owner_id = %actor.id, album = %title, "album deleted");
        Ok(())
    }

    pub async fn toggle_favorite(&self, actor: &Actor, title: &str) -> Result<FavoriteToggleResponse, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_field("title", "No album specified"));
        }
        let album = self.repo.toggle_favorite(&actor.id, title).await?;
        let status = if album.is_favorite { "favorited" } else { "unfavorited" };
        Ok(FavoriteToggleResponse {
            title: album.title,
            status: status.to_string(),
        })
    }
}
