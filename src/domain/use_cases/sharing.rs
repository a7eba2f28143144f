use uuid::Uuid;
use validator::Validate;

use crate::domain::use_cases::access::Actor;
use crate::entities::shared_access::{GrantList, ShareRequest, SharedAccess, SharedAccessInsert};
use crate::errors::AppError;
use crate::repositories::shared_access::SharedAccessRepository;
use crate::repositories::user::UserRepository;

/// Creates and removes the grants an owner hands out.
pub struct ShareHandler<R>
where
    R: UserRepository + SharedAccessRepository,
{
    pub repo: R,
}

impl<R> ShareHandler<R>
where
    R: UserRepository + SharedAccessRepository,
{
    pub fn new(repo: R) -> Self {
        ShareHandler { repo }
    }

    pub async fn share(&self, actor: &Actor, request: ShareRequest) -> Result<SharedAccess, AppError> {
        request.validate()?;

        let username = request.username.trim();
        let target = self
            .repo
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if target.id == actor.id {
            return Err(AppError::invalid_field("username", "You cannot share your gallery with yourself"));
        }

        if self.repo.find_grant(&actor.id, &target.id).await?.is_some() {
            return Err(AppError::Conflict("Access already granted".to_string()));
        }

        let alias = request
            .alias
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(&target.username)
            .to_string();

        let grant = self
            .repo
            .create_grant(&SharedAccessInsert {
                owner_id: actor.id,
                shared_user_id: target.id,
                alias,
                can_upload: request.can_upload,
                can_comment: request.can_comment,
            })
            .await?;

        tracing::info!(
            owner_id = %actor.id,
            shared_user_id = %target.id,
            can_upload = grant.can_upload,
            can_comment = grant.can_comment,
            "access granted"
        );
        Ok(grant)
    }

    pub async fn list_grants(&self, actor: &Actor) -> Result<GrantList, AppError> {
        Ok(GrantList {
            outgoing: self.repo.list_outgoing(&actor.id).await?,
            incoming: self.repo.list_incoming(&actor.id).await?,
        })
    }

    pub async fn revoke(&self, actor: &Actor, shared_user_id: &Uuid) -> Result<(), AppError> {
        self.repo.revoke_grant(&actor.id, shared_user_id).await?;
        tracing::info!(owner_id = %actor.id, shared_user_id = %shared_user_id, "access revoked");
        Ok(())
    }
}
