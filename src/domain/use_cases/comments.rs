use uuid::Uuid;

use crate::constants::COMMENT_MAX;
use crate::domain::use_cases::access::{AccessEvaluator, Actor, Capability};
use crate::domain::use_cases::gallery::check_filename;
use crate::entities::media::Comment;
use crate::errors::AppError;
use crate::repositories::metadata::MetadataRepository;
use crate::repositories::photo::PhotoRepository;
use crate::repositories::shared_access::SharedAccessRepository;

pub struct CommentHandler<R, M>
where
    R: PhotoRepository + SharedAccessRepository,
    M: MetadataRepository,
{
    pub repo: R,
    pub metadata: M,
    access: AccessEvaluator<R>,
}

impl<R, M> CommentHandler<R, M>
where
    R: PhotoRepository + SharedAccessRepository + Clone,
    M: MetadataRepository,
{
    pub fn new(repo: R, metadata: M) -> Self {
        CommentHandler {
            access: AccessEvaluator::new(repo.clone()),
            repo,
            metadata,
        }
    }

    /// Appends a comment to a photo in `owner_id`'s gallery (the actor's own
    /// when absent). Delegates comment under their grant alias.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        owner_id: Option<Uuid>,
        filename: &str,
        text: &str,
    ) -> Result<Comment, AppError> {
        let body = text.trim();
        if body.is_empty() {
            return Err(AppError::invalid_field("comment", "Comment cannot be empty"));
        }
        if body.chars().count() > COMMENT_MAX {
            return Err(AppError::invalid_field(
                "comment",
                format!("Comment must be at most {} characters", COMMENT_MAX),
            ));
        }
        check_filename(filename)?;

        let owner_id = owner_id.unwrap_or(actor.id);
        let alias = self.access.require(actor, &owner_id, Capability::Comment).await?;

        let photo = self
            .repo
            .find_photo(&owner_id, filename)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

        let comment = self.metadata.append_comment(&photo.id, &alias, body).await?;
        tracing::info!(owner_id = %owner_id, actor_id = %actor.id, file = %filename, "comment added");
        Ok(comment)
    }
}
