use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::constants::EMAIL_TOKEN_MAX_AGE_SECS;
use crate::entities::token::{Claims, EmailTokenClaims, RefreshClaims, TokenPurpose, TokenType};
use crate::entities::user::User;
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, KeyPair, SigningKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Issues and checks the three token families: session access tokens,
/// refresh tokens and one-hour email link tokens. Each family has its own
/// secret, so a token of one kind never validates as another.
#[derive(Clone)]
pub struct JwtService {
    keys: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: SigningKeys::from(config),
            access_ttl: Duration::minutes(config.jwt_expiration_minutes),
            refresh_ttl: Duration::days(config.refresh_token_exp_days),
        }
    }

    fn sign<C: Serialize>(claims: &C, key: &KeyPair) -> Result<String, AuthError> {
        encode(&Header::new(JWT_ALGORITHM), claims, &key.encoding)
            .map_err(|_| AuthError::TokenCreation)
    }

    fn verify<C: DeserializeOwned>(token: &str, key: &KeyPair, validation: &Validation) -> Result<TokenData<C>, AuthError> {
        Ok(decode::<C>(token, &key.decoding, validation)?)
    }

    pub fn create_jwt(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            verified: user.is_verified,
            exp: (now + self.access_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: TokenType::Access,
        };
        Self::sign(&claims, &self.keys.access)
    }

    pub fn create_refresh_jwt(&self, user_id: &Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            exp: (now + self.refresh_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: TokenType::Refresh,
        };
        Self::sign(&claims, &self.keys.refresh)
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let data: TokenData<Claims> = Self::verify(token, &self.keys.access, &Validation::new(JWT_ALGORITHM))?;
        match data.claims.token_type {
            TokenType::Access => Ok(data),
            _ => Err(AuthError::InvalidToken),
        }
    }

    pub fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError> {
        let data: TokenData<RefreshClaims> = Self::verify(token, &self.keys.refresh, &Validation::new(JWT_ALGORITHM))?;
        match data.claims.token_type {
            TokenType::Refresh => Ok(data),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Signs an email link token as if issued at `issued_at`.
    pub fn create_email_token_at(
        &self,
        email: &str,
        purpose: TokenPurpose,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let claims = EmailTokenClaims {
            sub: email.to_string(),
            purpose,
            iat,
            exp: iat + EMAIL_TOKEN_MAX_AGE_SECS,
        };
        Self::sign(&claims, &self.keys.email)
    }

    /// The email a link token was issued for. No leeway: a link is dead the
    /// second its hour is up.
    pub fn decode_email_token(&self, token: &str, purpose: TokenPurpose) -> Result<String, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data: TokenData<EmailTokenClaims> = Self::verify(token, &self.keys.email, &validation)?;
        if data.claims.purpose != purpose {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims.sub)
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, user: &User) -> Result<String, AuthError> {
        JwtService::create_jwt(self, user)
    }

    fn create_refresh_jwt(&self, user_id: &Uuid) -> Result<String, AuthError> {
        JwtService::create_refresh_jwt(self, user_id)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        JwtService::decode_jwt(self, token)
    }

    fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError> {
        JwtService::decode_refresh_jwt(self, token)
    }

    fn create_email_token(&self, email: &str, purpose: TokenPurpose) -> Result<String, AuthError> {
        self.create_email_token_at(email, purpose, Utc::now())
    }

    fn decode_email_token(&self, token: &str, purpose: TokenPurpose) -> Result<String, AuthError> {
        JwtService::decode_email_token(self, token, purpose)
    }
}
