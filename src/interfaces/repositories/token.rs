use jsonwebtoken::TokenData;
use uuid::Uuid;
use crate::{
    entities::{token::{Claims, RefreshClaims, TokenPurpose}, user::User},
    errors::AuthError,
};


pub trait TokenServiceRepository: Send + Sync {
    /// Creates a new JWT for the user
    fn create_jwt(&self, user: &User) -> Result<String, AuthError>;

    /// Creates a new refresh JWT for the user
    fn create_refresh_jwt(&self, user_id: &Uuid) -> Result<String, AuthError>;

    /// Decodes a JWT and returns the claims
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Decodes a refresh JWT and returns the claims
    fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError>;

    /// Signs a one-hour link token for an email address
    fn create_email_token(&self, email: &str, purpose: TokenPurpose) -> Result<String, AuthError>;

    /// Returns the email a link token was issued for
    fn decode_email_token(&self, token: &str, purpose: TokenPurpose) -> Result<String, AuthError>;
}
