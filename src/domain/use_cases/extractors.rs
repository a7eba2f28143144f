use actix_web::{FromRequest, HttpRequest, HttpMessage};
use futures_util::future::{ready, Ready};

use crate::domain::use_cases::access::Actor;
use crate::{entities::token::Claims, errors::AuthError};

/// Extractor for authenticated claims, ensuring the user is authenticated.
/// Returns 401 if the user is not authenticated.
/// Usage: Add `claims: AuthClaims` as a parameter to your handler function.
#[derive(Debug)]
pub struct AuthClaims(pub Claims);

impl AuthClaims {
    pub fn actor(&self) -> Result<Actor, AuthError> {
        Actor::from_claims(&self.0)
    }
}

impl FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthClaims(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}
