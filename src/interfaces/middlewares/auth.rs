use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{cache::token_store::ACCESS_DENY_PREFIX, entities::token::Claims, errors::AuthError, AppState};

pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in middleware");
                return Ok(reject(req, AuthError::MissingJwtService));
            };

            let Some(token) = bearer_token(req.headers()) else {
                tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                return Ok(reject(req, AuthError::MissingCredentials));
            };

            if let Some(store) = &state.token_store {
                match store.is_revoked(ACCESS_DENY_PREFIX, &token).await {
                    Ok(true) => return Ok(reject(req, AuthError::TokenRevoked)),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Deny-list lookup failed, continuing: {}", e),
                }
            }

            let claims: Claims = match state.auth_handler.token_service.decode_jwt(&token) {
                Ok(decoded) => decoded.claims,
                Err(e) => {
                    tracing::warn!(path = %req.path(), "Rejected access token: {}", e);
                    return Ok(reject(req, e));
                }
            };

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }

    if method == "GET" && path.starts_with("/verify/") {
        return true;
    }
    if path.starts_with("/reset_password/") && matches!(method, "GET" | "POST") {
        return true;
    }

    matches!(
        (path, method),
        ("/health", "GET") |
        ("/register", "POST") |
        ("/login", "POST") |
        ("/refresh", "POST") |
        ("/resend_verification", "POST") |
        ("/reset_password", "POST")
    )
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

fn reject(req: ServiceRequest, err: AuthError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}
