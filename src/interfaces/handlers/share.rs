use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::shared_access::ShareRequest;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(claims, state, body))]
pub async fn share(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<ShareRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let request = body.into_inner();
    let username = request.username.trim().to_string();

    let grant = state.share_handler.share(&actor, request).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": format!("Shared access granted to {}.", username),
        "grant": grant,
    })))
}

#[instrument(skip(claims, state))]
pub async fn list_grants(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let grants = state.share_handler.list_grants(&actor).await?;
    Ok(HttpResponse::Ok().json(grants))
}

#[instrument(skip(claims, state))]
pub async fn revoke(
    claims: AuthClaims,
    state: web::Data<AppState>,
    shared_user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    state.share_handler.revoke(&actor, &shared_user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
