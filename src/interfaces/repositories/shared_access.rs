use async_trait::async_trait;
use std::borrow::Cow;
use uuid::Uuid;

use crate::{
    entities::shared_access::{GrantView, SharedAccess, SharedAccessInsert},
    errors::AppError,
    repositories::sqlx_repo::SqlxRepo,
};

const GRANT_COLUMNS: &str = "id, owner_id, shared_user_id, alias, can_upload, can_comment, \
     require_upload_approval, require_comment_approval, created_at";

#[async_trait]
pub trait SharedAccessRepository: Send + Sync {
    async fn find_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<Option<SharedAccess>, AppError>;
    async fn create_grant(&self, grant: &SharedAccessInsert) -> Result<SharedAccess, AppError>;
    /// Grants the owner has handed out, with the delegate's username.
    async fn list_outgoing(&self, owner_id: &Uuid) -> Result<Vec<GrantView>, AppError>;
    /// Grants into other galleries, with the owner's username.
    async fn list_incoming(&self, shared_user_id: &Uuid) -> Result<Vec<GrantView>, AppError>;
    async fn revoke_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl SharedAccessRepository for SqlxRepo {
    async fn find_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<Option<SharedAccess>, AppError> {
        sqlx::query_as::<_, SharedAccess>(&format!(
            "SELECT {GRANT_COLUMNS} FROM shared_access WHERE owner_id = $1 AND shared_user_id = $2"
        ))
        .bind(owner_id)
        .bind(shared_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn create_grant(&self, grant: &SharedAccessInsert) -> Result<SharedAccess, AppError> {
        sqlx::query_as::<_, SharedAccess>(&format!(
            r#"
            INSERT INTO shared_access (owner_id, shared_user_id, alias, can_upload, can_comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GRANT_COLUMNS}
            "#
        ))
        .bind(grant.owner_id)
        .bind(grant.shared_user_id)
        .bind(&grant.alias)
        .bind(grant.can_upload)
        .bind(grant.can_comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Access already granted".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23514")) => {
                AppError::invalid_field("username", "You cannot share your gallery with yourself")
            }
            _ => AppError::from(e),
        })
    }

    async fn list_outgoing(&self, owner_id: &Uuid) -> Result<Vec<GrantView>, AppError> {
        sqlx::query_as::<_, GrantView>(
            r#"
            SELECT
                s.owner_id, s.shared_user_id, u.username AS counterpart_username,
                s.alias, s.can_upload, s.can_comment,
                s.require_upload_approval, s.require_comment_approval, s.created_at
            FROM shared_access s
            JOIN users u ON u.id = s.shared_user_id
            WHERE s.owner_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_incoming(&self, shared_user_id: &Uuid) -> Result<Vec<GrantView>, AppError> {
        sqlx::query_as::<_, GrantView>(
            r#"
            SELECT
                s.owner_id, s.shared_user_id, u.username AS counterpart_username,
                s.alias, s.can_upload, s.can_comment,
                s.require_upload_approval, s.require_comment_approval, s.created_at
            FROM shared_access s
            JOIN users u ON u.id = s.owner_id
            WHERE s.shared_user_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(shared_user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn revoke_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM shared_access WHERE owner_id = $1 AND shared_user_id = $2")
            .bind(owner_id)
            .bind(shared_user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("No such grant".to_string()));
        }
        Ok(())
    }
}
