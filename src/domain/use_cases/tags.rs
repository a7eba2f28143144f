use crate::constants::TAG_MAX;
use crate::domain::use_cases::access::Actor;
use crate::domain::use_cases::gallery::check_filename;
use crate::entities::photo::PhotoRecord;
use crate::errors::AppError;
use crate::repositories::metadata::MetadataRepository;
use crate::repositories::photo::PhotoRepository;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TagOutcome {
    pub changed: bool,
    pub message: String,
}

/// Tag edits on the actor's own photos.
pub struct TagHandler<R, M>
where
    R: PhotoRepository,
    M: MetadataRepository,
{
    pub repo: R,
    pub metadata: M,
}

fn clean_tag(field: &str, raw: &str) -> Result<String, AppError> {
    let tag = raw.trim();
    if tag.is_empty() {
        return Err(AppError::invalid_field(field, "Tag cannot be empty"));
    }
    if tag.chars().count() > TAG_MAX {
        return Err(AppError::invalid_field(
            field,
            format!("Tag must be at most {} characters", TAG_MAX),
        ));
    }
    Ok(tag.to_string())
}

impl<R, M> TagHandler<R, M>
where
    R: PhotoRepository,
    M: MetadataRepository,
{
    pub fn new(repo: R, metadata: M) -> Self {
        TagHandler { repo, metadata }
    }

    pub async fn add_tag(&self, actor: &Actor, filename: &str, tag: &str) -> Result<TagOutcome, AppError> {
        let tag = clean_tag("tag", tag)?;
        let photo = self.owned_photo(actor, filename).await?;

        let added = self.metadata.add_tag(&photo.id, &tag).await?;
        Ok(TagOutcome {
            changed: added,
            message: if added {
                format!("Tag '{}' added.", tag)
            } else {
                format!("Tag '{}' exists.", tag)
            },
        })
    }

    pub async fn remove_tag(&self, actor: &Actor, filename: &str, tag: &str) -> Result<TagOutcome, AppError> {
        let tag = clean_tag("tag", tag)?;
        let photo = self.owned_photo(actor, filename).await?;

        let removed = self.metadata.remove_tag(&photo.id, &tag).await?;
        Ok(TagOutcome {
            changed: removed,
            message: format!("Tag '{}' removed.", tag),
        })
    }

    pub async fn rename_tag_single(
        &self,
        actor: &Actor,
        filename: &str,
        old_tag: &str,
        new_tag: &str,
    ) -> Result<TagOutcome, AppError> {
        let old_tag = clean_tag("old_tag", old_tag)?;
        let new_tag = clean_tag("new_tag", new_tag)?;
        let photo = self.owned_photo(actor, filename).await?;

        let changed = self.metadata.rename_tag(&photo.id, &old_tag, &new_tag).await?;
        Ok(TagOutcome {
            changed,
            message: format!("Renamed '{}'→'{}' on {}.", old_tag, new_tag, filename),
        })
    }

    /// Renames across every photo the actor owns. `changed` is false when
    /// nothing carried the old tag.
    pub async fn rename_tag_global(&self, actor: &Actor, old_tag: &str, new_tag: &str) -> Result<TagOutcome, AppError> {
        let old_tag = clean_tag("old_tag", old_tag)?;
        let new_tag = clean_tag("new_tag", new_tag)?;

        let affected = self
            .metadata
            .rename_tag_for_owner(&actor.id, &old_tag, &new_tag)
            .await?;

        tracing::info!(owner_id = %actor.id, %old_tag, %new_tag, affected, "global tag rename");
        Ok(if affected > 0 {
            TagOutcome {
                changed: true,
                message: format!("Renamed '{}'→'{}' globally.", old_tag, new_tag),
            }
        } else {
            TagOutcome {
                changed: false,
                message: format!("No matches for '{}'.", old_tag),
            }
        })
    }

    async fn owned_photo(&self, actor: &Actor, filename: &str) -> Result<PhotoRecord, AppError> {
        check_filename(filename)?;
        self.repo
            .find_photo(&actor.id, filename)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }
}
