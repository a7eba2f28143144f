use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::media::CommentRequest;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(claims, state, body))]
pub async fn add_comment(
    claims: AuthClaims,
    state: web::Data<AppState>,
    filename: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    let comment = state
        .comment_handler
        .add_comment(&actor, body.owner_id, &filename, &body.comment)
        .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment added.",
        "comment": comment,
    })))
}
