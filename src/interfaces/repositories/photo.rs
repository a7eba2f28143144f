use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::photo::{Photo, PhotoInsert, PhotoRecord},
    errors::AppError,
    repositories::sqlx_repo::SqlxRepo,
};

const PHOTO_COLUMNS: &str = "id, user_id, album_id, storage_filename, original_filename, \
     media_kind, thumbnail_filename, uploader_alias, upload_seq, created_at";

const RECORD_SELECT: &str = r#"
    SELECT
        p.id, p.user_id, p.album_id, a.title AS album_title,
        p.storage_filename, p.original_filename, p.media_kind,
        p.thumbnail_filename, p.uploader_alias, p.upload_seq, p.created_at
    FROM photos p
    LEFT JOIN albums a ON a.id = p.album_id
"#;

/// File names known to the relational store, for the disk audit.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredMedia {
    pub user_id: Uuid,
    pub storage_filename: String,
    pub thumbnail_filename: Option<String>,
}

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// All rows commit together or none do. `album_title` is found or
    /// created inside the same transaction.
    async fn insert_photos(
        &self,
        owner_id: &Uuid,
        album_title: Option<&str>,
        photos: &[PhotoInsert],
    ) -> Result<Vec<Photo>, AppError>;
    /// Newest first. `album_id` narrows to one album.
    async fn list_photos(&self, owner_id: &Uuid, album_id: Option<&Uuid>) -> Result<Vec<PhotoRecord>, AppError>;
    async fn recent_in_album(&self, owner_id: &Uuid, album_id: &Uuid, limit: i64) -> Result<Vec<PhotoRecord>, AppError>;
    async fn find_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Option<PhotoRecord>, AppError>;
    async fn find_by_thumbnail(&self, owner_id: &Uuid, thumbnail_filename: &str) -> Result<Option<PhotoRecord>, AppError>;
    async fn delete_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Photo, AppError>;
    async fn list_stored_media(&self) -> Result<Vec<StoredMedia>, AppError>;
}

#[async_trait]
impl PhotoRepository for SqlxRepo {
    async fn insert_photos(
        &self,
        owner_id: &Uuid,
        album_title: Option<&str>,
        photos: &[PhotoInsert],
    ) -> Result<Vec<Photo>, AppError> {
        let mut tx = self.pool.begin().await?;

        let album_id: Option<Uuid> = match album_title {
            Some(title) => {
                sqlx::query(
                    r#"
                    INSERT INTO albums (user_id, title) VALUES ($1, $2)
                    ON CONFLICT (user_id, lower(title)) DO NOTHING
                    "#,
                )
                .bind(owner_id)
                .bind(title)
                .execute(&mut *tx)
                .await?;

                Some(
                    sqlx::query_scalar("SELECT id FROM albums WHERE user_id = $1 AND lower(title) = lower($2)")
                        .bind(owner_id)
                        .bind(title)
                        .fetch_one(&mut *tx)
                        .await?,
                )
            }
            None => None,
        };

        let mut inserted = Vec::with_capacity(photos.len());

        for photo in photos {
            let row = sqlx::query_as::<_, Photo>(&format!(
                r#"
                INSERT INTO photos (
                    user_id, album_id, storage_filename, original_filename,
                    media_kind, thumbnail_filename, uploader_alias
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {PHOTO_COLUMNS}
                "#
            ))
            .bind(owner_id)
            .bind(album_id)
            .bind(&photo.storage_filename)
            .bind(&photo.original_filename)
            .bind(photo.media_kind)
            .bind(&photo.thumbnail_filename)
            .bind(&photo.uploader_alias)
            .fetch_one(&mut *tx)
            .await?;

            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_photos(&self, owner_id: &Uuid, album_id: Option<&Uuid>) -> Result<Vec<PhotoRecord>, AppError> {
        sqlx::query_as::<_, PhotoRecord>(&format!(
            "{RECORD_SELECT} WHERE p.user_id = $1 AND ($2::uuid IS NULL OR p.album_id = $2) \
             ORDER BY p.upload_seq DESC"
        ))
        .bind(owner_id)
        .bind(album_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn recent_in_album(&self, owner_id: &Uuid, album_id: &Uuid, limit: i64) -> Result<Vec<PhotoRecord>, AppError> {
        sqlx::query_as::<_, PhotoRecord>(&format!(
            "{RECORD_SELECT} WHERE p.user_id = $1 AND p.album_id = $2 \
             ORDER BY p.upload_seq DESC LIMIT $3"
        ))
        .bind(owner_id)
        .bind(album_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Option<PhotoRecord>, AppError> {
        sqlx::query_as::<_, PhotoRecord>(&format!(
            "{RECORD_SELECT} WHERE p.user_id = $1 AND p.storage_filename = $2"
        ))
        .bind(owner_id)
        .bind(storage_filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_by_thumbnail(&self, owner_id: &Uuid, thumbnail_filename: &str) -> Result<Option<PhotoRecord>, AppError> {
        sqlx::query_as::<_, PhotoRecord>(&format!(
            "{RECORD_SELECT} WHERE p.user_id = $1 AND p.thumbnail_filename = $2"
        ))
        .bind(owner_id)
        .bind(thumbnail_filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn delete_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Photo, AppError> {
        sqlx::query_as::<_, Photo>(&format!(
            "DELETE FROM photos WHERE user_id = $1 AND storage_filename = $2 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(storage_filename)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }

    async fn list_stored_media(&self) -> Result<Vec<StoredMedia>, AppError> {
        sqlx::query_as::<_, StoredMedia>(
            "SELECT user_id, storage_filename, thumbnail_filename FROM photos",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
