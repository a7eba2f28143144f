use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::media::{GlobalRenameTagRequest, RenameTagRequest, TagRequest};
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(claims, state, body))]
pub async fn add_tag(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<TagRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let outcome = state.tag_handler.add_tag(&actor, &body.filename, &body.tag).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(skip(claims, state, body))]
pub async fn remove_tag(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<TagRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let outcome = state.tag_handler.remove_tag(&actor, &body.filename, &body.tag).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(skip(claims, state, body))]
pub async fn rename_tag_single(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<RenameTagRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let outcome = state
        .tag_handler
        .rename_tag_single(&actor, &body.filename, &body.old_tag, &body.new_tag)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(skip(claims, state, body))]
pub async fn rename_tag_global(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<GlobalRenameTagRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let outcome = state
        .tag_handler
        .rename_tag_global(&actor, &body.old_tag, &body.new_tag)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
