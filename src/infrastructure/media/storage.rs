use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use uuid::Uuid;

use crate::errors::StorageError;
use crate::infrastructure::utils::filename::is_storage_filename;

/// Filesystem layout: one directory per owner under the upload root,
/// plus a shared thumbnail directory.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    upload_root: PathBuf,
    thumbnail_dir: PathBuf,
}

impl MediaStorage {
    pub fn new(upload_root: impl Into<PathBuf>, thumbnail_dir: impl Into<PathBuf>) -> Self {
        MediaStorage {
            upload_root: upload_root.into(),
            thumbnail_dir: thumbnail_dir.into(),
        }
    }

    pub async fn ensure_roots(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.upload_root).await?;
        fs::create_dir_all(&self.thumbnail_dir).await?;
        Ok(())
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn owner_dir(&self, owner_id: &Uuid) -> PathBuf {
        self.upload_root.join(owner_id.to_string())
    }

    pub fn media_path(&self, owner_id: &Uuid, filename: &str) -> Result<PathBuf, StorageError> {
        check_name(filename)?;
        Ok(self.owner_dir(owner_id).join(filename))
    }

    pub fn thumbnail_path(&self, filename: &str) -> Result<PathBuf, StorageError> {
        check_name(filename)?;
        Ok(self.thumbnail_dir.join(filename))
    }

    /// Moves an uploaded temp file into the owner's directory.
    pub async fn persist(&self, source: &Path, owner_id: &Uuid, filename: &str) -> Result<PathBuf, StorageError> {
        let dest = self.media_path(owner_id, filename)?;
        fs::create_dir_all(self.owner_dir(owner_id)).await?;

        // Temp files may live on another filesystem; fall back to copy.
        if fs::rename(source, &dest).await.is_err() {
            fs::copy(source, &dest).await?;
            let _ = fs::remove_file(source).await;
        }
        Ok(dest)
    }

    /// `Ok(false)` when there was nothing to remove.
    pub async fn remove_media(&self, owner_id: &Uuid, filename: &str) -> Result<bool, StorageError> {
        remove_if_present(&self.media_path(owner_id, filename)?).await
    }

    pub async fn remove_thumbnail(&self, filename: &str) -> Result<bool, StorageError> {
        remove_if_present(&self.thumbnail_path(filename)?).await
    }

    pub async fn remove_owner_dir(&self, owner_id: &Uuid) -> Result<(), StorageError> {
        match fs::remove_dir_all(self.owner_dir(owner_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Owner directories found under the upload root with the files in each.
    pub async fn scan_uploads(&self) -> Result<Vec<(Uuid, Vec<String>)>, StorageError> {
        let mut owners = Vec::new();
        let mut entries = match fs::read_dir(&self.upload_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(owners),
            Err(e) => return Err(StorageError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(owner_id) = entry.file_name().to_str().and_then(|s| Uuid::parse_str(s).ok()) else {
                continue;
            };
            owners.push((owner_id, list_files(&entry.path()).await?));
        }

        Ok(owners)
    }

    pub async fn scan_thumbnails(&self) -> Result<Vec<String>, StorageError> {
        match list_files(&self.thumbnail_dir).await {
            Err(StorageError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Bytes read when sniffing content; enough for every signature `infer` knows.
const SNIFF_LEN: u64 = 8192;

/// Content type from the file's leading bytes. The file is rewound afterwards.
pub async fn sniff_kind(file: &mut fs::File) -> std::io::Result<Option<infer::Type>> {
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    (&mut *file).take(SNIFF_LEN).read_to_end(&mut header).await?;
    file.rewind().await?;
    Ok(infer::get(&header))
}

fn check_name(filename: &str) -> Result<(), StorageError> {
    if is_storage_filename(filename) {
        Ok(())
    } else {
        Err(StorageError::InvalidName(filename.to_string()))
    }
}

async fn remove_if_present(path: &Path) -> Result<bool, StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::Io(e)),
    }
}

async fn list_files(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
