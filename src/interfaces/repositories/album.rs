use async_trait::async_trait;
use std::borrow::Cow;
use uuid::Uuid;

use crate::{
    entities::album::{Album, AlbumStats},
    errors::AppError,
    repositories::sqlx_repo::SqlxRepo,
};

const ALBUM_COLUMNS: &str = "id, user_id, title, is_favorite, created_at";

/// Album titles compare case-insensitively everywhere.
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    async fn list_albums(&self, owner_id: &Uuid) -> Result<Vec<AlbumStats>, AppError>;
    async fn find_album(&self, owner_id: &Uuid, title: &str) -> Result<Option<Album>, AppError>;
    async fn create_album(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError>;
    async fn rename_album(&self, owner_id: &Uuid, title: &str, new_title: &str) -> Result<Album, AppError>;
    /// Photos in the album stay, with their album reference cleared.
    async fn delete_album(&self, owner_id: &Uuid, title: &str) -> Result<(), AppError>;
    async fn toggle_favorite(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError>;
    async fn favorite_titles(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError>;
}

fn album_conflict(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23505")) => {
            AppError::Conflict("An album with that name already exists".to_string())
        }
        _ => AppError::from(e),
    }
}

fn album_not_found() -> AppError {
    AppError::NotFound("Album not found".to_string())
}

#[async_trait]
impl AlbumRepository for SqlxRepo {
    async fn list_albums(&self, owner_id: &Uuid) -> Result<Vec<AlbumStats>, AppError> {
        sqlx::query_as::<_, AlbumStats>(
            r#"
            SELECT
                a.id,
                a.title,
                a.is_favorite,
                COUNT(p.id) FILTER (WHERE p.media_kind = 'image') AS photo_count,
                COUNT(p.id) FILTER (WHERE p.media_kind = 'video') AS video_count
            FROM albums a
            LEFT JOIN photos p ON p.album_id = a.id
            WHERE a.user_id = $1
            GROUP BY a.id
            ORDER BY lower(a.title), a.title
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_album(&self, owner_id: &Uuid, title: &str) -> Result<Option<Album>, AppError> {
        sqlx::query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM albums WHERE user_id = $1 AND lower(title) = lower($2)"
        ))
        .bind(owner_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn create_album(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError> {
        sqlx::query_as::<_, Album>(&format!(
            "INSERT INTO albums (user_id, title) VALUES ($1, $2) RETURNING {ALBUM_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(album_conflict)
    }

    async fn rename_album(&self, owner_id: &Uuid, title: &str, new_title: &str) -> Result<Album, AppError> {
        sqlx::query_as::<_, Album>(&format!(
            r#"
            UPDATE albums SET title = $3
            WHERE user_id = $1 AND lower(title) = lower($2)
            RETURNING {ALBUM_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(title)
        .bind(new_title)
        .fetch_optional(&self.pool)
        .await
        .map_err(album_conflict)?
        .ok_or_else(album_not_found)
    }

    async fn delete_album(&self, owner_id: &Uuid, title: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM albums WHERE user_id = $1 AND lower(title) = lower($2)")
            .bind(owner_id)
            .bind(title)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(album_not_found());
        }
        Ok(())
    }

    async fn toggle_favorite(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError> {
        sqlx::query_as::<_, Album>(&format!(
            r#"
            UPDATE albums SET is_favorite = NOT is_favorite
            WHERE user_id = $1 AND lower(title) = lower($2)
            RETURNING {ALBUM_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(album_not_found)
    }

    async fn favorite_titles(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT title FROM albums WHERE user_id = $1 AND is_favorite ORDER BY lower(title)",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
