use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};
use uuid::Uuid;

use crate::domain::password::{check_password, validate_password_strength};


#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserInsert {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "new_user_password", skip_on_field_errors = false))]
pub struct NewUser {
    #[validate(
        length(min = 3, max = 80, message = "Must be between 3 and 80 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"), length(max = 120))]
    pub email: String,

    #[validate(length(min = 8, message = "Must be at least 8 characters"))]
    pub password: String,

    pub confirm_password: String,
}

/// Strength is judged against the account's own username and email.
fn new_user_password(user: &NewUser) -> Result<(), ValidationError> {
    check_password(&user.password, &[user.username.as_str(), user.email.as_str()])?;
    check_confirmation(&user.password, &user.confirm_password)
}

pub(crate) fn check_confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        let mut error = ValidationError::new("password_mismatch");
        error.message = Some("Passwords do not match".into());
        return Err(error);
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if !valid {
        let mut error = ValidationError::new("username_charset");
        error.message = Some("Only letters, digits, '.', '_' and '-' are allowed".into());
        return Err(error);
    }
    Ok(())
}

impl NewUser {
    /// Trims the user-typed fields the same way every form does.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self
    }

    pub fn prepare_for_insert(&self, password_hash: String) -> UserInsert {
        UserInsert {
            username: self.username.clone(),
            email: self.email.clone(),
            password_hash,
            is_verified: false,
        }
    }
}


#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}


#[derive(Debug, Serialize, Deserialize)]
pub struct NewUserResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "reset_passwords_match", skip_on_field_errors = false))]
pub struct ResetPasswordRequest {
    #[validate(
        length(min = 8, message = "Must be at least 8 characters"),
        custom(
            function = "validate_password_strength",
            message = "Must include uppercase, number, and symbol"
        )
    )]
    pub password: String,

    pub confirm_password: String,
}

fn reset_passwords_match(request: &ResetPasswordRequest) -> Result<(), ValidationError> {
    check_confirmation(&request.password, &request.confirm_password)
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}
