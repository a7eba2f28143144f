use std::path::PathBuf;

use uuid::Uuid;

use crate::constants::DESCRIPTION_MAX;
use crate::domain::use_cases::access::{AccessEvaluator, Actor, Capability};
use crate::entities::media::{GalleryFilters, GalleryPage, MediaView};
use crate::entities::photo::PhotoRecord;
use crate::errors::{AppError, ConsistencyError};
use crate::infrastructure::media::storage::MediaStorage;
use crate::infrastructure::utils::filename::is_storage_filename;
use crate::repositories::album::AlbumRepository;
use crate::repositories::metadata::MetadataRepository;
use crate::repositories::photo::PhotoRepository;
use crate::repositories::shared_access::SharedAccessRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaVariant {
    Original,
    Thumbnail,
}

/// Resolved location of a file the caller may read.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub download_name: String,
}

/// Merges photo rows with their metadata, applying the filters, newest first.
pub async fn assemble_views<M: MetadataRepository>(
    metadata: &M,
    records: Vec<PhotoRecord>,
    viewer_is_owner: bool,
    filters: &GalleryFilters,
) -> Result<Vec<MediaView>, AppError> {
    let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    let mut by_photo = metadata.load_metadata(&ids).await?;

    let mut views = Vec::with_capacity(records.len());
    for record in records {
        let meta = by_photo.remove(&record.id).unwrap_or_default();
        if !filters.matches(&record.storage_filename, record.album_title.as_deref(), &meta) {
            continue;
        }
        views.push(MediaView::build(record, meta, viewer_is_owner));
    }
    Ok(views)
}

pub struct GalleryHandler<R, M>
where
    R: PhotoRepository + AlbumRepository + SharedAccessRepository,
    M: MetadataRepository,
{
    pub repo: R,
    pub metadata: M,
    pub storage: MediaStorage,
    access: AccessEvaluator<R>,
}

impl<R, M> GalleryHandler<R, M>
where
    R: PhotoRepository + AlbumRepository + SharedAccessRepository + Clone,
    M: MetadataRepository,
{
    pub fn new(repo: R, metadata: M, storage: MediaStorage) -> Self {
        GalleryHandler {
            access: AccessEvaluator::new(repo.clone()),
            repo,
            metadata,
            storage,
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        owner_id: Option<Uuid>,
        filters: GalleryFilters,
    ) -> Result<GalleryPage, AppError> {
        let owner_id = owner_id.unwrap_or(actor.id);
        self.access.require(actor, &owner_id, Capability::View).await?;

        let records = self.repo.list_photos(&owner_id, None).await?;
        let items = assemble_views(&self.metadata, records, owner_id == actor.id, &filters).await?;

        Ok(GalleryPage {
            owner_id,
            items,
            all_tags: self.metadata.owner_tags(&owner_id).await?,
            current_tag: filters.tag,
            search_query: filters.search,
            shared_with_me: self.repo.list_incoming(&actor.id).await?,
            favorite_albums: self.repo.favorite_titles(&owner_id).await?,
        })
    }

    pub async fn update_description(
        &self,
        actor: &Actor,
        filename: &str,
        description: &str,
    ) -> Result<(), AppError> {
        let description = description.trim();
        if description.chars().count() > DESCRIPTION_MAX {
            return Err(AppError::invalid_field(
                "description",
                format!("Description must be at most {} characters", DESCRIPTION_MAX),
            ));
        }

        let photo = self.owned_photo(actor, filename).await?;
        self.metadata.set_description(&photo.id, description).await
    }

    /// Removes the row first; its metadata cascades. Files go afterwards.
    pub async fn delete_photo(&self, actor: &Actor, filename: &str) -> Result<(), AppError> {
        check_filename(filename)?;
        let photo = self.repo.delete_photo(&actor.id, filename).await?;

        if let Err(e) = self.storage.remove_media(&actor.id, &photo.storage_filename).await {
            ConsistencyError::OrphanedFile {
                filename: photo.storage_filename.clone(),
                reason: e.to_string(),
            }
            .report(&actor.id);
        }
        if let Some(thumb) = &photo.thumbnail_filename {
            if let Err(e) = self.storage.remove_thumbnail(thumb).await {
                ConsistencyError::OrphanedFile {
                    filename: thumb.clone(),
                    reason: e.to_string(),
                }
                .report(&actor.id);
            }
        }

        tracing::info!(owner_id = %actor.id, file = %filename, "photo deleted");
        Ok(())
    }

    /// Finds the file behind a media URL, checking the caller may view it.
    pub async fn resolve_media(
        &self,
        actor: &Actor,
        owner_id: Option<Uuid>,
        filename: &str,
        variant: MediaVariant,
    ) -> Result<MediaFile, AppError> {
        check_filename(filename)?;
        let owner_id = owner_id.unwrap_or(actor.id);
        self.access.require(actor, &owner_id, Capability::View).await?;

        let not_found = || AppError::NotFound(format!("No file named {}", filename));
        match variant {
            MediaVariant::Original => {
                let photo = self
                    .repo
                    .find_photo(&owner_id, filename)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(MediaFile {
                    path: self.storage.media_path(&owner_id, &photo.storage_filename)?,
                    download_name: photo.original_filename,
                })
            }
            MediaVariant::Thumbnail => {
                self.repo
                    .find_by_thumbnail(&owner_id, filename)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(MediaFile {
                    path: self.storage.thumbnail_path(filename)?,
                    download_name: filename.to_string(),
                })
            }
        }
    }

    async fn owned_photo(&self, actor: &Actor, filename: &str) -> Result<PhotoRecord, AppError> {
        check_filename(filename)?;
        self.repo
            .find_photo(&actor.id, filename)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }
}

pub(crate) fn check_filename(filename: &str) -> Result<(), AppError> {
    if is_storage_filename(filename) {
        Ok(())
    } else {
        Err(AppError::InvalidInput("Invalid filename.".to_string()))
    }
}
