use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::media::{Comment, MetadataMap},
    errors::AppError,
    repositories::sqlx_repo::SqlxRepo,
};

/// One comment to attach when a batch of photos is registered.
#[derive(Debug, Clone)]
pub struct CommentSeed {
    pub photo_id: Uuid,
    pub author_alias: String,
    pub body: String,
}

/// Per-photo description, tag and comment records.
///
/// Every mutation touches a single record set in one statement or one
/// transaction, so concurrent writers on the same photo never drop each
/// other's changes. Records cascade away with their photo.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Photos without records are simply absent from the map.
    async fn load_metadata(&self, photo_ids: &[Uuid]) -> Result<MetadataMap, AppError>;
    async fn seed_comments(&self, seeds: &[CommentSeed]) -> Result<(), AppError>;
    async fn set_description(&self, photo_id: &Uuid, description: &str) -> Result<(), AppError>;
    /// `false` when a case-insensitive duplicate was already present.
    async fn add_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError>;
    async fn remove_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError>;
    async fn rename_tag(&self, photo_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<bool, AppError>;
    /// Number of the owner's photos whose tag set changed.
    async fn rename_tag_for_owner(&self, owner_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<u64, AppError>;
    async fn append_comment(&self, photo_id: &Uuid, author_alias: &str, body: &str) -> Result<Comment, AppError>;
    /// Distinct tags across the owner's photos, sorted case-insensitively.
    async fn owner_tags(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError>;
}

#[derive(sqlx::FromRow)]
struct DescriptionRow {
    photo_id: Uuid,
    description: String,
}

#[derive(sqlx::FromRow)]
struct TagRow {
    photo_id: Uuid,
    tag: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    photo_id: Uuid,
    #[sqlx(flatten)]
    comment: Comment,
}

#[async_trait]
impl MetadataRepository for SqlxRepo {
    async fn load_metadata(&self, photo_ids: &[Uuid]) -> Result<MetadataMap, AppError> {
        let mut map = MetadataMap::new();
        if photo_ids.is_empty() {
            return Ok(map);
        }

        let descriptions = sqlx::query_as::<_, DescriptionRow>(
            "SELECT photo_id, description FROM photo_descriptions WHERE photo_id = ANY($1)",
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, TagRow>(
            "SELECT photo_id, tag FROM photo_tags WHERE photo_id = ANY($1) ORDER BY id",
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT photo_id, author_alias, body, created_at
            FROM photo_comments
            WHERE photo_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(photo_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in descriptions {
            map.entry(row.photo_id).or_default().description = row.description;
        }
        for row in tags {
            map.entry(row.photo_id).or_default().tags.push(row.tag);
        }
        for row in comments {
            map.entry(row.photo_id).or_default().comments.push(row.comment);
        }

        Ok(map)
    }

    async fn seed_comments(&self, seeds: &[CommentSeed]) -> Result<(), AppError> {
        if seeds.is_empty() {
            return Ok(());
        }

        let photo_ids: Vec<Uuid> = seeds.iter().map(|s| s.photo_id).collect();
        let authors: Vec<&str> = seeds.iter().map(|s| s.author_alias.as_str()).collect();
        let bodies: Vec<&str> = seeds.iter().map(|s| s.body.as_str()).collect();

        sqlx::query(
            r#"
            INSERT INTO photo_comments (photo_id, author_alias, body)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[])
            "#,
        )
        .bind(&photo_ids)
        .bind(&authors)
        .bind(&bodies)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_description(&self, photo_id: &Uuid, description: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO photo_descriptions (photo_id, description)
            VALUES ($1, $2)
            ON CONFLICT (photo_id)
            DO UPDATE SET description = EXCLUDED.description, updated_at = NOW()
            "#,
        )
        .bind(photo_id)
        .bind(description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO photo_tags (photo_id, tag) VALUES ($1, $2)
            ON CONFLICT (photo_id, lower(tag)) DO NOTHING
            "#,
        )
        .bind(photo_id)
        .bind(tag)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM photo_tags WHERE photo_id = $1 AND lower(tag) = lower($2)")
            .bind(photo_id)
            .bind(tag)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rename_tag(&self, photo_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // The target already being present collapses the rename into a removal.
        let merged = sqlx::query(
            r#"
            DELETE FROM photo_tags t
            WHERE t.photo_id = $1
              AND lower(t.tag) = lower($2)
              AND lower($2) <> lower($3)
              AND EXISTS (
                  SELECT 1 FROM photo_tags o
                  WHERE o.photo_id = t.photo_id AND lower(o.tag) = lower($3)
              )
            "#,
        )
        .bind(photo_id)
        .bind(old_tag)
        .bind(new_tag)
        .execute(&mut *tx)
        .await?;

        let renamed = sqlx::query(
            "UPDATE photo_tags SET tag = $3 WHERE photo_id = $1 AND lower(tag) = lower($2) AND tag <> $3",
        )
        .bind(photo_id)
        .bind(old_tag)
        .bind(new_tag)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(merged.rows_affected() + renamed.rows_affected() > 0)
    }

    async fn rename_tag_for_owner(&self, owner_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let merged = sqlx::query(
            r#"
            DELETE FROM photo_tags t
            USING photos p
            WHERE t.photo_id = p.id
              AND p.user_id = $1
              AND lower(t.tag) = lower($2)
              AND lower($2) <> lower($3)
              AND EXISTS (
                  SELECT 1 FROM photo_tags o
                  WHERE o.photo_id = t.photo_id AND lower(o.tag) = lower($3)
              )
            "#,
        )
        .bind(owner_id)
        .bind(old_tag)
        .bind(new_tag)
        .execute(&mut *tx)
        .await?;

        let renamed = sqlx::query(
            r#"
            UPDATE photo_tags t SET tag = $3
            FROM photos p
            WHERE t.photo_id = p.id
              AND p.user_id = $1
              AND lower(t.tag) = lower($2)
              AND t.tag <> $3
            "#,
        )
        .bind(owner_id)
        .bind(old_tag)
        .bind(new_tag)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(merged.rows_affected() + renamed.rows_affected())
    }

    async fn append_comment(&self, photo_id: &Uuid, author_alias: &str, body: &str) -> Result<Comment, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO photo_comments (photo_id, author_alias, body)
            VALUES ($1, $2, $3)
            RETURNING author_alias, body, created_at
            "#,
        )
        .bind(photo_id)
        .bind(author_alias)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn owner_tags(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT tag FROM (
                SELECT DISTINCT t.tag
                FROM photo_tags t
                JOIN photos p ON p.id = t.photo_id
                WHERE p.user_id = $1
            ) owner_tags
            ORDER BY lower(tag), tag
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
