use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::media::{GalleryFilters, GalleryQuery};
use crate::entities::photo::UpdateDescriptionRequest;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(claims, state))]
pub async fn gallery(
    claims: AuthClaims,
    state: web::Data<AppState>,
    query: web::Query<GalleryQuery>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let query = query.into_inner();
    let filters = GalleryFilters::new(query.tag.as_deref(), query.search.as_deref());

    let page = state.gallery_handler.list(&actor, query.owner_id, filters).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(claims, state, body))]
pub async fn update_description(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
    body: web::Json<UpdateDescriptionRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    state
        .gallery_handler
        .update_description(&actor, &filename, &body.description)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Description updated."})))
}

#[instrument(skip(claims, state))]
pub async fn delete_photo(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    state.gallery_handler.delete_photo(&actor, &filename).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": format!("Deleted {}.", filename)})))
}
