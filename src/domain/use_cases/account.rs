use validator::Validate;

use crate::auth::password::verify_password;
use crate::domain::use_cases::access::Actor;
use crate::entities::user::DeleteAccountRequest;
use crate::errors::{AppError, ConsistencyError};
use crate::infrastructure::media::storage::MediaStorage;
use crate::repositories::photo::PhotoRepository;
use crate::repositories::user::UserRepository;

pub struct AccountHandler<R>
where
    R: UserRepository + PhotoRepository,
{
    pub repo: R,
    pub storage: MediaStorage,
}

impl<R> AccountHandler<R>
where
    R: UserRepository + PhotoRepository,
{
    pub fn new(repo: R, storage: MediaStorage) -> Self {
        AccountHandler { repo, storage }
    }

    /// Re-checks the password, deletes the user (albums, photos, metadata
    /// and grants in both directions cascade), then removes their files.
    pub async fn delete_account(&self, actor: &Actor, request: DeleteAccountRequest) -> Result<(), AppError> {
        request.validate()?;

        let user = self
            .repo
            .get_user_by_id(&actor.id)
            .await?
            .ok_or(AppError::UnauthorizedAccess)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::invalid_field("password", "Incorrect password"));
        }

        // Thumbnails live in a shared directory, so collect them before the rows go.
        let thumbnails: Vec<String> = self
            .repo
            .list_photos(&user.id, None)
            .await?
            .into_iter()
            .filter_map(|p| p.thumbnail_filename)
            .collect();

        self.repo.delete_user(&user.id).await?;
        tracing::info!(user_id = %user.id, "account deleted");

        if let Err(e) = self.storage.remove_owner_dir(&user.id).await {
            ConsistencyError::OrphanedFile {
                filename: self.storage.owner_dir(&user.id).display().to_string(),
                reason: e.to_string(),
            }
            .report(&user.id);
        }
        for thumb in thumbnails {
            if let Err(e) = self.storage.remove_thumbnail(&thumb).await {
                ConsistencyError::OrphanedFile { filename: thumb, reason: e.to_string() }.report(&user.id);
            }
        }
        Ok(())
    }
}
