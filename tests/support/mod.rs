#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use photo_gallery::{
    auth::password::hash_password,
    email::sender::{EmailMessage, EmailSender},
    entities::{
        album::{Album, AlbumStats},
        media::{Comment, MetadataMap},
        photo::{MediaKind, Photo, PhotoInsert, PhotoRecord},
        shared_access::{GrantView, SharedAccess, SharedAccessInsert},
        user::{User, UserInsert},
    },
    errors::{AppError, EmailError, TranscodeError},
    media::{storage::MediaStorage, transcoder::MediaTranscoder},
    repositories::{
        album::AlbumRepository,
        metadata::{CommentSeed, MetadataRepository},
        photo::{PhotoRepository, StoredMedia},
        shared_access::SharedAccessRepository,
        user::UserRepository,
    },
    settings::{AppConfig, AppEnvironment},
    use_cases::{
        access::Actor,
        gallery::GalleryHandler,
        ingest::{IngestHandler, UploadedFile},
    },
};

pub const PASSWORD: &str = "Tr4il-Mix-Gallery-Owl!";

#[derive(Default)]
struct State {
    users: Vec<User>,
    albums: Vec<Album>,
    photos: Vec<Photo>,
    grants: Vec<SharedAccess>,
    descriptions: HashMap<Uuid, String>,
    tags: Vec<(Uuid, String)>,
    comments: Vec<(Uuid, Comment)>,
    next_seq: i64,
    fail_inserts: bool,
    fail_seeds: bool,
}

impl State {
    fn album_index(&self, owner_id: &Uuid, title: &str) -> Option<usize> {
        let wanted = title.to_lowercase();
        self.albums
            .iter()
            .position(|a| a.user_id == *owner_id && a.title.to_lowercase() == wanted)
    }

    fn record(&self, photo: &Photo) -> PhotoRecord {
        PhotoRecord {
            id: photo.id,
            user_id: photo.user_id,
            album_id: photo.album_id,
            album_title: photo
                .album_id
                .and_then(|id| self.albums.iter().find(|a| a.id == id))
                .map(|a| a.title.clone()),
            storage_filename: photo.storage_filename.clone(),
            original_filename: photo.original_filename.clone(),
            media_kind: photo.media_kind,
            thumbnail_filename: photo.thumbnail_filename.clone(),
            uploader_alias: photo.uploader_alias.clone(),
            upload_seq: photo.upload_seq,
            created_at: photo.created_at,
        }
    }

    fn newest_first(&self, mut photos: Vec<&Photo>) -> Vec<PhotoRecord> {
        photos.sort_by(|a, b| b.upload_seq.cmp(&a.upload_seq));
        photos.into_iter().map(|p| self.record(p)).collect()
    }

    fn insert_album(&mut self, owner_id: &Uuid, title: &str) -> Album {
        let album = Album {
            id: Uuid::new_v4(),
            user_id: *owner_id,
            title: title.to_string(),
            is_favorite: false,
            created_at: Utc::now(),
        };
        self.albums.push(album.clone());
        album
    }

    fn forget_photos(&mut self, ids: &[Uuid]) {
        self.photos.retain(|p| !ids.contains(&p.id));
        self.descriptions.retain(|id, _| !ids.contains(id));
        self.tags.retain(|(id, _)| !ids.contains(id));
        self.comments.retain(|(id, _)| !ids.contains(id));
    }

    /// Same two steps as the SQL rename: merge into an existing target, then rewrite.
    fn rename_on_photo(&mut self, photo_id: &Uuid, old_tag: &str, new_tag: &str) -> u64 {
        let old = old_tag.to_lowercase();
        let new = new_tag.to_lowercase();
        let mut affected = 0;

        let has_target = self.tags.iter().any(|(id, t)| id == photo_id && t.to_lowercase() == new);
        if old != new && has_target {
            let before = self.tags.len();
            self.tags.retain(|(id, t)| !(id == photo_id && t.to_lowercase() == old));
            affected += (before - self.tags.len()) as u64;
        }

        for (id, tag) in self.tags.iter_mut() {
            if *id == *photo_id && tag.to_lowercase() == old && tag.as_str() != new_tag {
                *tag = new_tag.to_string();
                affected += 1;
            }
        }
        affected
    }

    fn grant_view(&self, grant: &SharedAccess, counterpart: &Uuid) -> GrantView {
        GrantView {
            owner_id: grant.owner_id,
            shared_user_id: grant.shared_user_id,
            counterpart_username: self
                .users
                .iter()
                .find(|u| u.id == *counterpart)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            alias: grant.alias.clone(),
            can_upload: grant.can_upload,
            can_comment: grant.can_comment,
            require_upload_approval: grant.require_upload_approval,
            require_comment_approval: grant.require_comment_approval,
            created_at: grant.created_at,
        }
    }
}

/// In-memory stand-in for the Postgres repositories, with the same
/// uniqueness and cascade rules as the schema.
#[derive(Clone, Default)]
pub struct MemoryRepo {
    state: Arc<Mutex<State>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn fail_photo_inserts(&self) {
        self.lock().fail_inserts = true;
    }

    pub fn fail_comment_seeds(&self) {
        self.lock().fail_seeds = true;
    }

    pub fn add_user(&self, username: &str, verified: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: hash_password(PASSWORD).unwrap(),
            is_verified: verified,
            created_at: now,
            updated_at: now,
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn user(&self, id: &Uuid) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == *id).cloned()
    }

    pub fn add_grant(&self, owner: &User, delegate: &User, alias: &str, can_upload: bool, can_comment: bool) {
        self.lock().grants.push(SharedAccess {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            shared_user_id: delegate.id,
            alias: alias.to_string(),
            can_upload,
            can_comment,
            require_upload_approval: false,
            require_comment_approval: false,
            created_at: Utc::now(),
        });
    }

    /// Registers a photo row directly, bypassing ingest.
    pub fn add_photo(&self, owner_id: &Uuid, filename: &str, album: Option<&str>) -> Photo {
        let mut state = self.lock();
        let album_id = album.map(|title| match state.album_index(owner_id, title) {
            Some(i) => state.albums[i].id,
            None => state.insert_album(owner_id, title).id,
        });
        state.next_seq += 1;
        let media_kind = if filename.ends_with(".mp4") { MediaKind::Video } else { MediaKind::Image };
        let photo = Photo {
            id: Uuid::new_v4(),
            user_id: *owner_id,
            album_id,
            storage_filename: filename.to_string(),
            original_filename: filename.to_string(),
            media_kind,
            thumbnail_filename: None,
            uploader_alias: "owner".to_string(),
            upload_seq: state.next_seq,
            created_at: Utc::now(),
        };
        state.photos.push(photo.clone());
        photo
    }

    pub fn tag(&self, photo_id: &Uuid, tags: &[&str]) {
        let mut state = self.lock();
        for tag in tags {
            state.tags.push((*photo_id, tag.to_string()));
        }
    }

    pub fn tags_of(&self, photo_id: &Uuid) -> Vec<String> {
        self.lock()
            .tags
            .iter()
            .filter(|(id, _)| id == photo_id)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn comments_of(&self, photo_id: &Uuid) -> Vec<Comment> {
        self.lock()
            .comments
            .iter()
            .filter(|(id, _)| id == photo_id)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn photos_of(&self, owner_id: &Uuid) -> Vec<Photo> {
        self.lock().photos.iter().filter(|p| p.user_id == *owner_id).cloned().collect()
    }

    pub fn album_count(&self, owner_id: &Uuid) -> usize {
        self.lock().albums.iter().filter(|a| a.user_id == *owner_id).count()
    }

    pub fn grant_count(&self) -> usize {
        self.lock().grants.len()
    }

    pub fn metadata_rows(&self) -> usize {
        let state = self.lock();
        state.descriptions.len() + state.tags.len() + state.comments.len()
    }
}

#[async_trait]
impl UserRepository for MemoryRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_user(&self, user: &UserInsert) -> Result<Uuid, AppError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        let now = Utc::now();
        let id = Uuid::new_v4();
        state.users.push(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_verified: user.is_verified,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.user(id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        Ok(self.lock().users.iter().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn mark_verified(&self, id: &Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.is_verified = true;
        Ok(())
    }

    async fn update_password(&self, id: &Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let before = state.users.len();
        state.users.retain(|u| u.id != *id);
        if state.users.len() == before {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let owned: Vec<Uuid> = state.photos.iter().filter(|p| p.user_id == *id).map(|p| p.id).collect();
        state.forget_photos(&owned);
        state.albums.retain(|a| a.user_id != *id);
        state.grants.retain(|g| g.owner_id != *id && g.shared_user_id != *id);
        Ok(())
    }
}

#[async_trait]
impl AlbumRepository for MemoryRepo {
    async fn list_albums(&self, owner_id: &Uuid) -> Result<Vec<AlbumStats>, AppError> {
        let state = self.lock();
        let mut stats: Vec<AlbumStats> = state
            .albums
            .iter()
            .filter(|a| a.user_id == *owner_id)
            .map(|a| {
                let count = |kind: MediaKind| {
                    state
                        .photos
                        .iter()
                        .filter(|p| p.album_id == Some(a.id) && p.media_kind == kind)
                        .count() as i64
                };
                AlbumStats {
                    id: a.id,
                    title: a.title.clone(),
                    is_favorite: a.is_favorite,
                    photo_count: count(MediaKind::Image),
                    video_count: count(MediaKind::Video),
                }
            })
            .collect();
        stats.sort_by_key(|s| s.title.to_lowercase());
        Ok(stats)
    }

    async fn find_album(&self, owner_id: &Uuid, title: &str) -> Result<Option<Album>, AppError> {
        let state = self.lock();
        Ok(state.album_index(owner_id, title).map(|i| state.albums[i].clone()))
    }

    async fn create_album(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError> {
        let mut state = self.lock();
        if state.album_index(owner_id, title).is_some() {
            return Err(AppError::Conflict("An album with that name already exists".to_string()));
        }
        Ok(state.insert_album(owner_id, title))
    }

    async fn rename_album(&self, owner_id: &Uuid, title: &str, new_title: &str) -> Result<Album, AppError> {
        let mut state = self.lock();
        let index = state
            .album_index(owner_id, title)
            .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
        if let Some(other) = state.album_index(owner_id, new_title) {
            if other != index {
                return Err(AppError::Conflict("An album with that name already exists".to_string()));
            }
        }
        state.albums[index].title = new_title.to_string();
        Ok(state.albums[index].clone())
    }

    async fn delete_album(&self, owner_id: &Uuid, title: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let index = state
            .album_index(owner_id, title)
            .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
        let album = state.albums.remove(index);
        for photo in state.photos.iter_mut().filter(|p| p.album_id == Some(album.id)) {
            photo.album_id = None;
        }
        Ok(())
    }

    async fn toggle_favorite(&self, owner_id: &Uuid, title: &str) -> Result<Album, AppError> {
        let mut state = self.lock();
        let index = state
            .album_index(owner_id, title)
            .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
        state.albums[index].is_favorite = !state.albums[index].is_favorite;
        Ok(state.albums[index].clone())
    }

    async fn favorite_titles(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError> {
        let mut titles: Vec<String> = self
            .lock()
            .albums
            .iter()
            .filter(|a| a.user_id == *owner_id && a.is_favorite)
            .map(|a| a.title.clone())
            .collect();
        titles.sort_by_key(|t| t.to_lowercase());
        Ok(titles)
    }
}

#[async_trait]
impl PhotoRepository for MemoryRepo {
    async fn insert_photos(
        &self,
        owner_id: &Uuid,
        album_title: Option<&str>,
        photos: &[PhotoInsert],
    ) -> Result<Vec<Photo>, AppError> {
        let mut state = self.lock();
        if state.fail_inserts {
            return Err(AppError::InternalError("connection reset".to_string()));
        }

        let album_id = album_title.map(|title| match state.album_index(owner_id, title) {
            Some(i) => state.albums[i].id,
            None => state.insert_album(owner_id, title).id,
        });

        let mut inserted = Vec::with_capacity(photos.len());
        for row in photos {
            state.next_seq += 1;
            let photo = Photo {
                id: Uuid::new_v4(),
                user_id: *owner_id,
                album_id,
                storage_filename: row.storage_filename.clone(),
                original_filename: row.original_filename.clone(),
                media_kind: row.media_kind,
                thumbnail_filename: row.thumbnail_filename.clone(),
                uploader_alias: row.uploader_alias.clone(),
                upload_seq: state.next_seq,
                created_at: Utc::now(),
            };
            state.photos.push(photo.clone());
            inserted.push(photo);
        }
        Ok(inserted)
    }

    async fn list_photos(&self, owner_id: &Uuid, album_id: Option<&Uuid>) -> Result<Vec<PhotoRecord>, AppError> {
        let state = self.lock();
        let photos = state
            .photos
            .iter()
            .filter(|p| p.user_id == *owner_id)
            .filter(|p| album_id.is_none_or(|id| p.album_id == Some(*id)))
            .collect();
        Ok(state.newest_first(photos))
    }

    async fn recent_in_album(&self, owner_id: &Uuid, album_id: &Uuid, limit: i64) -> Result<Vec<PhotoRecord>, AppError> {
        let mut records = self.list_photos(owner_id, Some(album_id)).await?;
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn find_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Option<PhotoRecord>, AppError> {
        let state = self.lock();
        Ok(state
            .photos
            .iter()
            .find(|p| p.user_id == *owner_id && p.storage_filename == storage_filename)
            .map(|p| state.record(p)))
    }

    async fn find_by_thumbnail(&self, owner_id: &Uuid, thumbnail_filename: &str) -> Result<Option<PhotoRecord>, AppError> {
        let state = self.lock();
        Ok(state
            .photos
            .iter()
            .find(|p| p.user_id == *owner_id && p.thumbnail_filename.as_deref() == Some(thumbnail_filename))
            .map(|p| state.record(p)))
    }

    async fn delete_photo(&self, owner_id: &Uuid, storage_filename: &str) -> Result<Photo, AppError> {
        let mut state = self.lock();
        let photo = state
            .photos
            .iter()
            .find(|p| p.user_id == *owner_id && p.storage_filename == storage_filename)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;
        state.forget_photos(&[photo.id]);
        Ok(photo)
    }

    async fn list_stored_media(&self) -> Result<Vec<StoredMedia>, AppError> {
        Ok(self
            .lock()
            .photos
            .iter()
            .map(|p| StoredMedia {
                user_id: p.user_id,
                storage_filename: p.storage_filename.clone(),
                thumbnail_filename: p.thumbnail_filename.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl SharedAccessRepository for MemoryRepo {
    async fn find_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<Option<SharedAccess>, AppError> {
        Ok(self
            .lock()
            .grants
            .iter()
            .find(|g| g.owner_id == *owner_id && g.shared_user_id == *shared_user_id)
            .cloned())
    }

    async fn create_grant(&self, grant: &SharedAccessInsert) -> Result<SharedAccess, AppError> {
        let mut state = self.lock();
        if grant.owner_id == grant.shared_user_id {
            return Err(AppError::invalid_field("username", "You cannot share your gallery with yourself"));
        }
        if state
            .grants
            .iter()
            .any(|g| g.owner_id == grant.owner_id && g.shared_user_id == grant.shared_user_id)
        {
            return Err(AppError::Conflict("Access already granted".to_string()));
        }
        let created = SharedAccess {
            id: Uuid::new_v4(),
            owner_id: grant.owner_id,
            shared_user_id: grant.shared_user_id,
            alias: grant.alias.clone(),
            can_upload: grant.can_upload,
            can_comment: grant.can_comment,
            require_upload_approval: false,
            require_comment_approval: false,
            created_at: Utc::now(),
        };
        state.grants.push(created.clone());
        Ok(created)
    }

    async fn list_outgoing(&self, owner_id: &Uuid) -> Result<Vec<GrantView>, AppError> {
        let state = self.lock();
        Ok(state
            .grants
            .iter()
            .filter(|g| g.owner_id == *owner_id)
            .map(|g| state.grant_view(g, &g.shared_user_id))
            .collect())
    }

    async fn list_incoming(&self, shared_user_id: &Uuid) -> Result<Vec<GrantView>, AppError> {
        let state = self.lock();
        Ok(state
            .grants
            .iter()
            .filter(|g| g.shared_user_id == *shared_user_id)
            .map(|g| state.grant_view(g, &g.owner_id))
            .collect())
    }

    async fn revoke_grant(&self, owner_id: &Uuid, shared_user_id: &Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let before = state.grants.len();
        state
            .grants
            .retain(|g| !(g.owner_id == *owner_id && g.shared_user_id == *shared_user_id));
        if state.grants.len() == before {
            return Err(AppError::NotFound("No such grant".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataRepository for MemoryRepo {
    async fn load_metadata(&self, photo_ids: &[Uuid]) -> Result<MetadataMap, AppError> {
        let state = self.lock();
        let mut map = MetadataMap::new();
        for (id, description) in state.descriptions.iter().filter(|(id, _)| photo_ids.contains(*id)) {
            map.entry(*id).or_default().description = description.clone();
        }
        for (id, tag) in state.tags.iter().filter(|(id, _)| photo_ids.contains(id)) {
            map.entry(*id).or_default().tags.push(tag.clone());
        }
        for (id, comment) in state.comments.iter().filter(|(id, _)| photo_ids.contains(id)) {
            map.entry(*id).or_default().comments.push(comment.clone());
        }
        Ok(map)
    }

    async fn seed_comments(&self, seeds: &[CommentSeed]) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.fail_seeds {
            return Err(AppError::InternalError("metadata store unavailable".to_string()));
        }
        for seed in seeds {
            state.comments.push((
                seed.photo_id,
                Comment {
                    author_alias: seed.author_alias.clone(),
                    body: seed.body.clone(),
                    created_at: Utc::now(),
                },
            ));
        }
        Ok(())
    }

    async fn set_description(&self, photo_id: &Uuid, description: &str) -> Result<(), AppError> {
        self.lock().descriptions.insert(*photo_id, description.to_string());
        Ok(())
    }

    async fn add_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError> {
        let mut state = self.lock();
        let wanted = tag.to_lowercase();
        if state.tags.iter().any(|(id, t)| id == photo_id && t.to_lowercase() == wanted) {
            return Ok(false);
        }
        state.tags.push((*photo_id, tag.to_string()));
        Ok(true)
    }

    async fn remove_tag(&self, photo_id: &Uuid, tag: &str) -> Result<bool, AppError> {
        let mut state = self.lock();
        let wanted = tag.to_lowercase();
        let before = state.tags.len();
        state.tags.retain(|(id, t)| !(id == photo_id && t.to_lowercase() == wanted));
        Ok(state.tags.len() < before)
    }

    async fn rename_tag(&self, photo_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<bool, AppError> {
        Ok(self.lock().rename_on_photo(photo_id, old_tag, new_tag) > 0)
    }

    async fn rename_tag_for_owner(&self, owner_id: &Uuid, old_tag: &str, new_tag: &str) -> Result<u64, AppError> {
        let mut state = self.lock();
        let owned: Vec<Uuid> = state.photos.iter().filter(|p| p.user_id == *owner_id).map(|p| p.id).collect();
        Ok(owned
            .iter()
            .map(|id| state.rename_on_photo(id, old_tag, new_tag))
            .sum())
    }

    async fn append_comment(&self, photo_id: &Uuid, author_alias: &str, body: &str) -> Result<Comment, AppError> {
        let comment = Comment {
            author_alias: author_alias.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        self.lock().comments.push((*photo_id, comment.clone()));
        Ok(comment)
    }

    async fn owner_tags(&self, owner_id: &Uuid) -> Result<Vec<String>, AppError> {
        let state = self.lock();
        let owned: Vec<Uuid> = state.photos.iter().filter(|p| p.user_id == *owner_id).map(|p| p.id).collect();
        let mut tags: Vec<String> = state
            .tags
            .iter()
            .filter(|(id, _)| owned.contains(id))
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        tags.dedup();
        Ok(tags)
    }
}

/// Writes a placeholder JPEG where ffmpeg would, or fails on request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTranscoder {
    pub fail_conversion: bool,
    pub fail_thumbnails: bool,
}

#[async_trait]
impl MediaTranscoder for ScriptedTranscoder {
    async fn convert_to_jpeg(&self, _source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        // Leave partial output behind like an interrupted encoder would.
        tokio::fs::write(dest, b"partial")
            .await
            .map_err(|e| TranscodeError::Spawn("ffmpeg".into(), e.to_string()))?;
        if self.fail_conversion {
            return Err(TranscodeError::Failed("ffmpeg".into(), "unsupported HEVC profile".into()));
        }
        Ok(())
    }

    async fn video_thumbnail(&self, _source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        if self.fail_thumbnails {
            return Err(TranscodeError::Failed("ffmpeg".into(), "no video stream".into()));
        }
        tokio::fs::write(dest, b"thumb")
            .await
            .map_err(|e| TranscodeError::Spawn("ffmpeg".into(), e.to_string()))
    }
}

/// Keeps every message instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The token at the end of the last link mailed to `to`.
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| {
                m.text_body
                    .lines()
                    .find(|l| l.starts_with("http"))
                    .and_then(|l| l.rsplit('/').next())
                    .map(str::to_string)
            })
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "gallery-test".into(),
        port: 0,
        host: "127.0.0.1".into(),
        worker_count: 1,
        database_url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
        redis_url: None,
        cors_allowed_origins: vec!["*".into()],
        jwt_secret: "j".repeat(48),
        jwt_expiration_minutes: 15,
        refresh_token_secret: "r".repeat(48),
        refresh_token_exp_days: 7,
        email_token_secret: "e".repeat(48),
        public_base_url: "http://gallery.test".into(),
        upload_dir: root.join("uploads"),
        thumbnail_dir: root.join("thumbnails"),
        ffmpeg_path: "ffmpeg".into(),
        ffprobe_path: "ffprobe".into(),
        max_upload_mb: 5,
        email_api_url: None,
        email_api_key: None,
        email_sender: "gallery@example.com".into(),
        audit_interval_hours: 24,
    }
}

pub fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.username.clone())
}

/// Temp directory with media roots plus a shared in-memory repository.
pub struct Harness {
    pub repo: MemoryRepo,
    pub storage: MediaStorage,
    root: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(root.path().join("uploads"), root.path().join("thumbnails"));
        storage.ensure_roots().await.unwrap();
        tokio::fs::create_dir_all(root.path().join("incoming")).await.unwrap();

        Harness { repo: MemoryRepo::new(), storage, root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn ingest(&self, transcoder: ScriptedTranscoder) -> IngestHandler<MemoryRepo, MemoryRepo, ScriptedTranscoder> {
        IngestHandler::new(self.repo.clone(), self.repo.clone(), transcoder, self.storage.clone())
    }

    pub fn gallery(&self) -> GalleryHandler<MemoryRepo, MemoryRepo> {
        GalleryHandler::new(self.repo.clone(), self.repo.clone(), self.storage.clone())
    }

    /// Drops `bytes` into a temp file the way the multipart extractor would.
    pub async fn upload(&self, original_filename: &str, bytes: &[u8]) -> UploadedFile {
        let temp_path: PathBuf = self.root.path().join("incoming").join(Uuid::new_v4().to_string());
        tokio::fs::write(&temp_path, bytes).await.unwrap();
        UploadedFile {
            original_filename: original_filename.to_string(),
            temp_path,
        }
    }

    /// Writes a stored file for a photo registered with `MemoryRepo::add_photo`.
    pub async fn place(&self, owner_id: &Uuid, filename: &str) -> PathBuf {
        let path = self.storage.media_path(owner_id, filename).unwrap();
        tokio::fs::create_dir_all(self.storage.owner_dir(owner_id)).await.unwrap();
        tokio::fs::write(&path, b"pixels").await.unwrap();
        path
    }

    pub async fn stored_files(&self, owner_id: &Uuid) -> Vec<String> {
        self.storage
            .scan_uploads()
            .await
            .unwrap()
            .into_iter()
            .find(|(owner, _)| owner == owner_id)
            .map(|(_, files)| files)
            .unwrap_or_default()
    }

    pub async fn thumbnails(&self) -> Vec<String> {
        self.storage.scan_thumbnails().await.unwrap()
    }
}
