use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::entities::token::RefreshTokenRequest;
use crate::entities::user::{
    DeleteAccountRequest, EmailRequest, LoginUser, LogoutRequest, NewUser, ResetPasswordRequest,
};
use crate::errors::{AppError, AuthError, LinkTokenError};
use crate::middlewares::auth::bearer_token;
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[instrument(skip(state, user))]
pub async fn register(
    state: web::Data<AppState>,
    user: web::Json<NewUser>,
) -> Result<impl Responder, AppError> {
    let response = state.auth_handler.register(user.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(state, user))]
pub async fn login(
    state: web::Data<AppState>,
    user: web::Json<LoginUser>,
) -> Result<impl Responder, AuthError> {
    let tokens = state.auth_handler.login(user.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[instrument(skip(state, request))]
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AuthError> {
    let tokens = state
        .auth_handler
        .refresh_token(&request.refresh_token, state.token_store.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[instrument(skip(request, state, body))]
pub async fn logout(
    request: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LogoutRequest>,
) -> Result<impl Responder, AuthError> {
    let access_token = bearer_token(request.headers()).ok_or(AuthError::MissingCredentials)?;

    state
        .auth_handler
        .logout(&access_token, &body.refresh_token, state.token_store.as_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "You've been logged out."})))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<impl Responder, LinkTokenError> {
    let message = state.auth_handler.verify_email(&token).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": message})))
}

#[instrument(skip(state, body))]
pub async fn resend_verification(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let message = state.auth_handler.resend_verification(&body.email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": message})))
}

#[instrument(skip(state, body))]
pub async fn request_password_reset(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let message = state.auth_handler.request_password_reset(&body.email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": message})))
}

#[instrument(skip(state, token))]
pub async fn check_reset_token(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<impl Responder, LinkTokenError> {
    let email = state.auth_handler.check_reset_token(&token).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"email": email, "valid": true})))
}

#[instrument(skip(state, token, body))]
pub async fn reset_password(
    state: web::Data<AppState>,
    token: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, LinkTokenError> {
    let message = state
        .auth_handler
        .reset_password(&token, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": message})))
}

#[instrument(skip(claims, state, body))]
pub async fn delete_account(
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<DeleteAccountRequest>,
) -> Result<impl Responder, AppError> {
    let actor = claims.actor()?;
    state
        .account_handler
        .delete_account(&actor, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Your account has been deleted."})))
}
