use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::anyhow;
use tokio::time::{interval, Duration};
use uuid::Uuid;

use crate::constants::AUDIT_GRACE_SECS;
use crate::errors::ConsistencyError;
use crate::media::storage::MediaStorage;
use crate::repositories::photo::PhotoRepository;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    pub missing_files: usize,
    pub untracked_files: usize,
}

/// Written within the last `grace`, so possibly still waiting for its row.
async fn is_fresh(path: &Path, grace: Duration) -> bool {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age < grace)
}

/// Compares photo rows with what is on disk. Drift is reported, never
/// repaired. Untracked files younger than `grace` are skipped.
pub async fn run_audit<R: PhotoRepository>(
    repo: &R,
    storage: &MediaStorage,
    grace: Duration,
) -> anyhow::Result<AuditSummary> {
    let rows = repo
        .list_stored_media()
        .await
        .map_err(|e| anyhow!("listing photo rows: {e}"))?;
    let on_disk: HashMap<Uuid, HashSet<String>> = storage
        .scan_uploads()
        .await
        .map_err(|e| anyhow!("scanning {}: {e}", storage.upload_root().display()))?
        .into_iter()
        .map(|(owner, files)| (owner, files.into_iter().collect()))
        .collect();
    let thumbs_on_disk: HashSet<String> = storage
        .scan_thumbnails()
        .await
        .map_err(|e| anyhow!("scanning thumbnails: {e}"))?
        .into_iter()
        .collect();

    let mut summary = AuditSummary::default();
    let mut tracked: HashMap<Uuid, HashSet<&str>> = HashMap::new();
    let mut tracked_thumbs: HashSet<&str> = HashSet::new();

    for row in &rows {
        tracked.entry(row.user_id).or_default().insert(row.storage_filename.as_str());

        let present = on_disk
            .get(&row.user_id)
            .is_some_and(|files| files.contains(&row.storage_filename));
        if !present {
            summary.missing_files += 1;
            ConsistencyError::MissingFile { filename: row.storage_filename.clone() }.report(&row.user_id);
        }

        if let Some(thumb) = &row.thumbnail_filename {
            tracked_thumbs.insert(thumb.as_str());
            if !thumbs_on_disk.contains(thumb) {
                summary.missing_files += 1;
                ConsistencyError::MissingFile { filename: thumb.clone() }.report(&row.user_id);
            }
        }
    }

    for (owner, files) in &on_disk {
        for file in files {
            let known = tracked.get(owner).is_some_and(|names| names.contains(file.as_str()));
            if known {
                continue;
            }
            if let Ok(path) = storage.media_path(owner, file) {
                if is_fresh(&path, grace).await {
                    continue;
                }
            }
            summary.untracked_files += 1;
            ConsistencyError::UntrackedFile { filename: file.clone() }.report(owner);
        }
    }

    for thumb in &thumbs_on_disk {
        if tracked_thumbs.contains(thumb.as_str()) {
            continue;
        }
        if let Ok(path) = storage.thumbnail_path(thumb) {
            if is_fresh(&path, grace).await {
                continue;
            }
        }
        summary.untracked_files += 1;
        ConsistencyError::UntrackedFile { filename: thumb.clone() }.report(&Uuid::nil());
    }

    Ok(summary)
}

pub async fn start_audit_task<R: PhotoRepository>(repo: R, storage: MediaStorage, every_hours: u64) {
    let mut interval = interval(Duration::from_secs(60 * 60 * every_hours.max(1)));

    loop {
        interval.tick().await;

        match run_audit(&repo, &storage, Duration::from_secs(AUDIT_GRACE_SECS)).await {
            Ok(summary) => tracing::info!(
                missing = summary.missing_files,
                untracked = summary.untracked_files,
                "Media audit finished"
            ),
            Err(e) => tracing::error!("Media audit failed: {:#}", e),
        }
    }
}
