use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::album::{AlbumTitleRequest, CreateAlbumRequest, RenameAlbumRequest};
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(claims, state))]
pub async fn list_albums(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let albums = state.album_handler.list_albums(&actor).await?;
    Ok(HttpResponse::Ok().json(albums))
}

#[instrument(skip(claims, state))]
pub async fn view_album(
    claims: AuthClaims,
    state: web::Data<AppState>,
    title: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let page = state.album_handler.view_album(&actor, &title).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(claims, state, body))]
pub async fn create_album(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<CreateAlbumRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let album = state.album_handler.create_album(&actor, &body.title).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": format!("Album '{}' created.", album.title),
        "album": album.title,
    })))
}

#[instrument(skip(claims, state, body))]
pub async fn rename_album(
    claims: AuthClaims,
    state: web::Data<AppState>,
    title: web::Path<String>,
    body: web::Json<RenameAlbumRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let album = state
        .album_handler
        .rename_album(&actor, &title, &body.new_title)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Album renamed to '{}'.", album.title),
        "album": album.title,
    })))
}

#[instrument(skip(claims, state, body))]
pub async fn delete_album(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<AlbumTitleRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    state.album_handler.delete_album(&actor, &body.title).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Album '{}' deleted.", body.title.trim()),
    })))
}

#[instrument(skip(claims, state, body))]
pub async fn toggle_favorite(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<AlbumTitleRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let response = state.album_handler.toggle_favorite(&actor, &body.title).await?;
    Ok(HttpResponse::Ok().json(response))
}
