use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::domain::use_cases::access::{AccessEvaluator, Actor, Capability};
use crate::entities::album::AlbumSelector;
use crate::entities::photo::{
    extension_of, needs_conversion, thumbnail_name_for, MediaKind, PhotoInsert,
};
use crate::errors::{AppError, ConsistencyError, IngestError};
use crate::infrastructure::media::storage::{sniff_kind, MediaStorage};
use crate::infrastructure::media::transcoder::MediaTranscoder;
use crate::infrastructure::utils::filename::{display_filename, new_storage_filename};
use crate::repositories::metadata::{CommentSeed, MetadataRepository};
use crate::repositories::photo::PhotoRepository;
use crate::repositories::shared_access::SharedAccessRepository;

/// A file received from the client, still sitting in a temp location.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: String,
    pub temp_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestedMedia {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub media_kind: MediaKind,
    pub thumbnail: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    pub filename: String,
    pub reason: String,
    pub error: IngestError,
}

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub succeeded: Vec<IngestedMedia>,
    pub failed: Vec<FailedUpload>,
    pub warnings: Vec<String>,
}

impl IngestReport {
    fn fail(&mut self, filename: &str, error: IngestError) {
        self.failed.push(FailedUpload {
            filename: filename.to_string(),
            reason: error.to_string(),
            error,
        });
    }
}

/// A file that made it to disk and waits for the relational commit.
#[derive(Debug)]
struct StagedFile {
    storage_filename: String,
    original_filename: String,
    media_kind: MediaKind,
    thumbnail_filename: Option<String>,
}

pub struct IngestHandler<R, M, T>
where
    R: PhotoRepository + SharedAccessRepository,
    M: MetadataRepository,
    T: MediaTranscoder,
{
    pub repo: R,
    pub metadata: M,
    pub transcoder: T,
    pub storage: MediaStorage,
    access: AccessEvaluator<R>,
}

impl<R, M, T> IngestHandler<R, M, T>
where
    R: PhotoRepository + SharedAccessRepository + Clone,
    M: MetadataRepository,
    T: MediaTranscoder,
{
    pub fn new(repo: R, metadata: M, transcoder: T, storage: MediaStorage) -> Self {
        IngestHandler {
            access: AccessEvaluator::new(repo.clone()),
            repo,
            metadata,
            transcoder,
            storage,
        }
    }

    /// Stores every acceptable file, commits all photo rows at once, then
    /// seeds the upload comments. One bad file never sinks its siblings.
    pub async fn ingest(
        &self,
        actor: &Actor,
        owner_id: &Uuid,
        files: Vec<UploadedFile>,
        album: Option<AlbumSelector>,
    ) -> Result<IngestReport, AppError> {
        let alias = self.access.require(actor, owner_id, Capability::Upload).await?;

        if files.is_empty() {
            return Err(AppError::invalid_field("photos", "No files selected"));
        }

        let mut report = IngestReport::default();
        let mut staged = Vec::with_capacity(files.len());

        for file in files {
            let original = display_filename(&file.original_filename);
            match self.stage(owner_id, &original, &file.temp_path).await {
                Ok(entry) => {
                    tracing::info!(owner_id = %owner_id, original = %original, stored = %entry.storage_filename, "file staged");
                    staged.push(entry);
                }
                Err(error) => {
                    tracing::warn!(owner_id = %owner_id, original = %original, %error, "file rejected");
                    report.fail(&original, error);
                }
            }
        }

        if staged.is_empty() {
            return Ok(report);
        }

        let photos = match self.commit(owner_id, &alias, &staged, album.as_ref()).await {
            Ok(photos) => photos,
            Err(e) => {
                tracing::error!(owner_id = %owner_id, error = %e, "upload commit failed; discarding staged files");
                for entry in &staged {
                    self.discard(owner_id, entry).await;
                    report.fail(&entry.original_filename, IngestError::CommitFailed);
                }
                return Ok(report);
            }
        };

        let seeds: Vec<CommentSeed> = photos
            .iter()
            .map(|(id, _)| CommentSeed {
                photo_id: *id,
                author_alias: alias.clone(),
                body: format!("Uploaded by {}", alias),
            })
            .collect();

        if let Err(e) = self.metadata.seed_comments(&seeds).await {
            ConsistencyError::MetadataAfterCommit {
                photo_ids: seeds.iter().map(|s| s.photo_id).collect(),
                reason: e.to_string(),
            }
            .report(owner_id);
            report
                .warnings
                .push("Files were saved but their upload comments could not be recorded".to_string());
        }

        let album_title = album.map(|a| a.title().to_string());
        for ((id, _), entry) in photos.into_iter().zip(staged) {
            report.succeeded.push(IngestedMedia {
                id,
                filename: entry.storage_filename,
                original_filename: entry.original_filename,
                media_kind: entry.media_kind,
                thumbnail: entry.thumbnail_filename,
                album: album_title.clone(),
            });
        }

        Ok(report)
    }

    async fn stage(&self, owner_id: &Uuid, original: &str, temp_path: &Path) -> Result<StagedFile, IngestError> {
        let ext = extension_of(original).ok_or(IngestError::UnsupportedType)?;
        let media_kind = MediaKind::from_extension(&ext).ok_or(IngestError::UnsupportedType)?;

        sniff(temp_path).await?;

        let storage_filename = if needs_conversion(&ext) {
            let name = new_storage_filename("jpg");
            let dest = self.storage.media_path(owner_id, &name).map_err(|_| IngestError::StorageFailed)?;
            tokio::fs::create_dir_all(self.storage.owner_dir(owner_id))
                .await
                .map_err(|_| IngestError::StorageFailed)?;
            if let Err(e) = self.transcoder.convert_to_jpeg(temp_path, &dest).await {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(IngestError::ConversionFailed(e.to_string()));
            }
            name
        } else {
            let name = new_storage_filename(&ext);
            self.storage
                .persist(temp_path, owner_id, &name)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "could not persist upload");
                    IngestError::StorageFailed
                })?;
            name
        };

        let thumbnail_filename = match media_kind {
            MediaKind::Image => None,
            MediaKind::Video => self.make_thumbnail(owner_id, &storage_filename).await,
        };

        Ok(StagedFile {
            storage_filename,
            original_filename: original.to_string(),
            media_kind,
            thumbnail_filename,
        })
    }

    /// A missing preview never fails the upload.
    async fn make_thumbnail(&self, owner_id: &Uuid, storage_filename: &str) -> Option<String> {
        let thumb_name = thumbnail_name_for(storage_filename);
        let source = self.storage.media_path(owner_id, storage_filename).ok()?;
        let dest = self.storage.thumbnail_path(&thumb_name).ok()?;

        match self.transcoder.video_thumbnail(&source, &dest).await {
            Ok(()) => Some(thumb_name),
            Err(e) => {
                tracing::warn!(file = %storage_filename, error = %e, "thumbnail generation failed");
                None
            }
        }
    }

    async fn commit(
        &self,
        owner_id: &Uuid,
        alias: &str,
        staged: &[StagedFile],
        album: Option<&AlbumSelector>,
    ) -> Result<Vec<(Uuid, String)>, AppError> {
        let rows: Vec<PhotoInsert> = staged
            .iter()
            .map(|entry| PhotoInsert {
                storage_filename: entry.storage_filename.clone(),
                original_filename: entry.original_filename.clone(),
                media_kind: entry.media_kind,
                thumbnail_filename: entry.thumbnail_filename.clone(),
                uploader_alias: alias.to_string(),
            })
            .collect();

        let inserted = self
            .repo
            .insert_photos(owner_id, album.map(AlbumSelector::title), &rows)
            .await?;
        Ok(inserted.into_iter().map(|p| (p.id, p.storage_filename)).collect())
    }

    async fn discard(&self, owner_id: &Uuid, entry: &StagedFile) {
        if let Err(e) = self.storage.remove_media(owner_id, &entry.storage_filename).await {
            tracing::error!(file = %entry.storage_filename, error = %e, "could not remove staged file");
        }
        if let Some(thumb) = &entry.thumbnail_filename {
            if let Err(e) = self.storage.remove_thumbnail(thumb).await {
                tracing::error!(file = %thumb, error = %e, "could not remove staged thumbnail");
            }
        }
    }
}

/// Rejects content that is recognisably something other than an image or
/// video. Unrecognised content passes; the extension already decided the kind.
async fn sniff(path: &Path) -> Result<(), IngestError> {
    let mut file = tokio::fs::File::open(path).await.map_err(|_| IngestError::StorageFailed)?;
    match sniff_kind(&mut file).await {
        Ok(Some(kind)) => match kind.matcher_type() {
            infer::MatcherType::Image | infer::MatcherType::Video => Ok(()),
            _ => Err(IngestError::ContentMismatch(kind.mime_type().to_string())),
        },
        Ok(None) => Ok(()),
        Err(_) => Err(IngestError::StorageFailed),
    }
}
