use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::album::AlbumSelector;
use crate::entities::photo::UploadForm;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::use_cases::ingest::UploadedFile;
use crate::AppState;

/// Ingests a batch. Answers 201 when at least one file made it, 400 when
/// every file was rejected; the per-file report is in the body either way.
#[instrument(skip(claims, state, form))]
pub async fn upload(
    claims: AuthClaims,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;

    let owner_id = match form.owner_id.as_ref().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|_| AppError::invalid_field("owner_id", "Invalid owner id"))?,
        None => actor.id,
    };

    let album = AlbumSelector::from_form(
        form.album.as_ref().map(|t| t.as_str()),
        form.new_album.as_ref().map(|t| t.as_str()),
    )?;

    // The temp files are deleted when `form` drops, so it outlives the ingest.
    let files: Vec<UploadedFile> = form
        .photos
        .iter()
        .filter(|f| f.size > 0 || f.file_name.as_deref().is_some_and(|n| !n.is_empty()))
        .map(|f| UploadedFile {
            original_filename: f.file_name.clone().unwrap_or_default(),
            temp_path: f.file.path().to_path_buf(),
        })
        .collect();

    let report = state
        .ingest_handler
        .ingest(&actor, &owner_id, files, album)
        .await?;

    tracing::info!(
        owner_id = %owner_id,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "upload batch finished"
    );

    if report.succeeded.is_empty() {
        Ok(HttpResponse::BadRequest().json(report))
    } else {
        Ok(HttpResponse::Created().json(report))
    }
}
