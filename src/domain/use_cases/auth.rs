use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::cache::token_store::{TokenDenylist, ACCESS_DENY_PREFIX, REFRESH_DENY_PREFIX};
use crate::entities::token::{AuthResponse, TokenPurpose};
use crate::entities::user::{LoginUser, NewUser, NewUserResponse, ResetPasswordRequest, User};
use crate::errors::{AppError, AuthError, LinkTokenError};
use crate::infrastructure::email::sender::{password_reset_email, verification_email, EmailSender};
use crate::interfaces::repositories::user::UserRepository;
use crate::repositories::token::TokenServiceRepository;

pub const RESET_REQUESTED_MESSAGE: &str = "If your email is registered, a reset link has been sent.";
pub const VERIFICATION_RESENT_MESSAGE: &str =
    "If your email is registered and unverified, a new verification link has been sent.";

pub struct AuthHandler<R, T, E>
where
    R: UserRepository,
    T: TokenServiceRepository,
    E: EmailSender,
{
    pub user_repo: R,
    pub token_service: T,
    pub mailer: E,
    public_base_url: String,
}

impl<R, T, E> AuthHandler<R, T, E>
where
    R: UserRepository,
    T: TokenServiceRepository,
    E: EmailSender,
{
    pub fn new(user_repo: R, token_service: T, mailer: E, public_base_url: impl Into<String>) -> Self {
        AuthHandler {
            user_repo,
            token_service,
            mailer,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Registers an unverified user and mails the verification link.
    /// A delivery failure does not undo the registration.
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        let hashed_password = hash_password(&request.password)?;
        let user_insert = request.prepare_for_insert(hashed_password);
        let user_id = self.user_repo.create_user(&user_insert).await?;

        if let Err(e) = self.send_verification(&user_insert.email, &user_insert.username).await {
            tracing::warn!(user_id = %user_id, error = %e, "verification email not sent");
        }

        tracing::info!(user_id = %user_id, "user registered");
        Ok(NewUserResponse {
            id: user_id,
            message: "Account created! Please verify your email before logging in.".to_string(),
        })
    }

    /// Logs in a user by validating credentials and generating JWTs
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self.user_repo.get_user_by_username(request.username.trim())
            .await
            .map_err(|_e| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        let is_password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|_| AuthError::WrongCredentials)?;
        if !is_password_valid {
            return Err(AuthError::WrongCredentials);
        }
        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let response = self.create_auth_response(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(response)
    }

    pub fn create_auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self.token_service.create_jwt(user)
            .map_err(|e| {
                tracing::warn!("Failed to create JWT: {}", e);
                AuthError::TokenCreation
            })?;

        let refresh_token = self.token_service.create_refresh_jwt(&user.id)
            .map_err(|e| {
                tracing::warn!("Failed to create refresh JWT: {}", e);
                AuthError::TokenCreation
            })?;
        Ok(AuthResponse::new(access_token, refresh_token))
    }

    /// Refreshes the access token using the refresh token
    pub async fn refresh_token(
        &self,
        token: &str,
        denylist: Option<&TokenDenylist>,
    ) -> Result<AuthResponse, AuthError> {
        let decoded = self.token_service.decode_refresh_jwt(token)?;
        if let Some(denylist) = denylist {
            if denylist.is_revoked(REFRESH_DENY_PREFIX, token).await? {
                return Err(AuthError::TokenRevoked);
            }
        }

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AuthError::InvalidUserId)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        self.create_auth_response(&user)
    }

    /// Deny-lists both tokens until they would have expired anyway.
    /// Without a token store there is nothing to revoke.
    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: &str,
        denylist: Option<&TokenDenylist>,
    ) -> Result<(), AuthError> {
        let access = self.token_service.decode_jwt(access_token)?;
        let refresh = self.token_service.decode_refresh_jwt(refresh_token)?;
        if access.claims.sub != refresh.claims.sub {
            return Err(AuthError::InvalidToken);
        }

        let Some(denylist) = denylist else {
            tracing::debug!(user_id = %access.claims.sub, "logout without token store");
            return Ok(());
        };

        let now = Utc::now().timestamp().max(0) as usize;
        denylist
            .revoke(ACCESS_DENY_PREFIX, access_token, access.claims.exp.saturating_sub(now) as u64)
            .await?;
        denylist
            .revoke(REFRESH_DENY_PREFIX, refresh_token, refresh.claims.exp.saturating_sub(now) as u64)
            .await?;

        tracing::info!(user_id = %access.claims.sub, "tokens revoked");
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<String, LinkTokenError> {
        let user = self.redeem(token, TokenPurpose::Verify).await?;
        if user.is_verified {
            return Ok("Account already verified. Please log in.".to_string());
        }

        self.user_repo.mark_verified(&user.id).await?;
        tracing::info!(user_id = %user.id, "email verified");
        Ok("Your email has been verified. You can now log in.".to_string())
    }

    /// Always answers the same message so the endpoint does not reveal
    /// which addresses are registered.
    pub async fn resend_verification(&self, email: &str) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        if let Some(user) = self.user_repo.get_user_by_email(&email).await? {
            if !user.is_verified {
                if let Err(e) = self.send_verification(&user.email, &user.username).await {
                    tracing::warn!(user_id = %user.id, error = %e, "verification email not resent");
                }
            }
        }
        Ok(VERIFICATION_RESENT_MESSAGE.to_string())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        if let Some(user) = self.user_repo.get_user_by_email(&email).await? {
            let token = self.token_service.create_email_token(&user.email, TokenPurpose::Reset)?;
            let link = format!("{}/reset_password/{}", self.public_base_url, token);
            if let Err(e) = self.mailer.send(password_reset_email(&user.email, &user.username, &link)).await {
                tracing::warn!(user_id = %user.id, error = %e, "password reset email not sent");
            }
        }
        Ok(RESET_REQUESTED_MESSAGE.to_string())
    }

    /// Confirms a reset link is still usable; returns the address it targets.
    pub async fn check_reset_token(&self, token: &str) -> Result<String, LinkTokenError> {
        let user = self.redeem(token, TokenPurpose::Reset).await?;
        Ok(user.email)
    }

    pub async fn reset_password(
        &self,
        token: &str,
        request: ResetPasswordRequest,
    ) -> Result<String, LinkTokenError> {
        let user = self.redeem(token, TokenPurpose::Reset).await?;
        request.validate().map_err(AppError::from)?;

        let hashed_password = hash_password(&request.password).map_err(AppError::from)?;
        self.user_repo.update_password(&user.id, &hashed_password).await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok("Your password has been updated. Please log in.".to_string())
    }

    async fn redeem(&self, token: &str, purpose: TokenPurpose) -> Result<User, LinkTokenError> {
        let email = self
            .token_service
            .decode_email_token(token, purpose)
            .map_err(|e| LinkTokenError::from_auth(purpose, e))?;

        self.user_repo
            .get_user_by_email(&email)
            .await?
            .ok_or(LinkTokenError::UnknownUser(purpose))
    }

    async fn send_verification(&self, email: &str, username: &str) -> Result<(), AppError> {
        let token = self.token_service.create_email_token(email, TokenPurpose::Verify)?;
        let link = format!("{}/verify/{}", self.public_base_url, token);
        self.mailer
            .send(verification_email(email, username, &link))
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }
}
