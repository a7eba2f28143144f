use actix_web::http::header::{
    CacheControl, CacheDirective, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{web, HttpResponse, Responder};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entities::media::OwnerQuery;
use crate::errors::AppError;
use crate::infrastructure::media::storage::sniff_kind;
use crate::use_cases::extractors::AuthClaims;
use crate::use_cases::gallery::{MediaFile, MediaVariant};
use crate::AppState;

#[instrument(skip(claims, state))]
pub async fn serve_upload(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
    query: web::Query<OwnerQuery>,
) -> Result<impl Responder, AppError> {
    let file = resolve(&claims, &state, &filename, query.owner_id, MediaVariant::Original).await?;
    stream_file(file, false).await
}

#[instrument(skip(claims, state))]
pub async fn serve_thumbnail(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
    query: web::Query<OwnerQuery>,
) -> Result<impl Responder, AppError> {
    let file = resolve(&claims, &state, &filename, query.owner_id, MediaVariant::Thumbnail).await?;
    stream_file(file, false).await
}

#[instrument(skip(claims, state))]
pub async fn download(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
    query: web::Query<OwnerQuery>,
) -> Result<impl Responder, AppError> {
    let file = resolve(&claims, &state, &filename, query.owner_id, MediaVariant::Original).await?;
    stream_file(file, true).await
}

async fn resolve(
    claims: &AuthClaims,
    state: &AppState,
    filename: &str,
    owner_id: Option<uuid::Uuid>,
    variant: MediaVariant,
) -> Result<MediaFile, AppError> {
    let actor = claims.actor()?;
    state
        .gallery_handler
        .resolve_media(&actor, owner_id, filename, variant)
        .await
}

async fn stream_file(file: MediaFile, as_attachment: bool) -> Result<HttpResponse, AppError> {
    let mut handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("No file named {}", file.download_name))
        } else {
            AppError::InternalError(format!("cannot open {}: {}", file.path.display(), e))
        }
    })?;

    let content_type = sniff_kind(&mut handle)
        .await
        .map_err(|e| AppError::InternalError(format!("cannot read {}: {}", file.path.display(), e)))?
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    let mut response = HttpResponse::Ok();
    response
        .content_type(content_type)
        .insert_header(CacheControl(vec![CacheDirective::Private, CacheDirective::MaxAge(3600)]));

    if as_attachment {
        response.insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.download_name)],
        });
    }

    Ok(response.streaming(ReaderStream::new(handle)))
}
