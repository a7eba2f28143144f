use std::borrow::Cow;
use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::{self, ContentType}, StatusCode},
    HttpResponse
};
use jsonwebtoken::errors::{ErrorKind, Error as JwtError};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::entities::token::TokenPurpose;

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    UnauthorizedAccess,
    ForbiddenAccess,
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::ForbiddenAccess => write!(f, "Forbidden access"),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            AppError::InvalidInput(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                serde_json::json!({"error": msg})
            }
            AppError::InternalError(detail) => {
                tracing::error!(%detail, "internal error");
                serde_json::json!({"error": "Something went wrong. Please try again."})
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenAccess => StatusCode::FORBIDDEN,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl AppError {
    /// Single-field validation failure, for checks that live outside `validator` derives.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Database conflict occurred".into())
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                AppError::Conflict("Foreign key violation".into())
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23514")) => {
                AppError::InvalidInput("Request violates a data constraint".into())
            }
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("No file named {}", name)),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation | AuthError::MissingJwtService => {
                AppError::InternalError(err.to_string())
            }
            _ => AppError::UnauthorizedAccess,
        }
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("Invalid token")]
    InvalidToken,

    #[display("Wrong credentials")]
    WrongCredentials,

    #[display("Token creation error")]
    TokenCreation,

    #[display("Token expired")]
    TokenExpired,

    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Missing JWT service")]
    MissingJwtService,

    #[display("Invalid user ID")]
    InvalidUserId,

    #[display("Please verify your email before logging in.")]
    EmailNotVerified,

    #[display("Authentication failed")]
    AuthenticationFailed,

    #[display("Token revoked")]
    TokenRevoked,

    #[display("Redis operation failed: {_0}")]
    RedisOperation(String),
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_message = match self {
            AuthError::TokenExpired => "Token has expired".to_string(),
            AuthError::RedisOperation(detail) => {
                tracing::error!(%detail, "token store unavailable");
                "Authentication service unavailable".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({"error": error_message}))
    }
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::MissingJwtService => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidUserId => StatusCode::BAD_REQUEST,
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AuthError::TokenRevoked => StatusCode::UNAUTHORIZED,
            AuthError::RedisOperation(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        tracing::warn!("password check failed: {}", err);
        AuthError::AuthenticationFailed
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(_: ValidationErrors) -> Self {
        AuthError::MissingCredentials
    }
}

/// Failure while redeeming an emailed link. Token problems send the client
/// back to the page where a fresh link can be requested.
#[derive(Debug)]
pub enum LinkTokenError {
    Expired(TokenPurpose),
    Invalid(TokenPurpose),
    UnknownUser(TokenPurpose),
    App(AppError),
}

impl LinkTokenError {
    pub fn from_auth(purpose: TokenPurpose, err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => LinkTokenError::Expired(purpose),
            _ => LinkTokenError::Invalid(purpose),
        }
    }

    pub fn retry_location(purpose: TokenPurpose) -> &'static str {
        match purpose {
            TokenPurpose::Verify => "/resend_verification",
            TokenPurpose::Reset => "/reset_password",
        }
    }
}

impl fmt::Display for LinkTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |p: &TokenPurpose| match p {
            TokenPurpose::Verify => "verification",
            TokenPurpose::Reset => "reset",
        };
        match self {
            LinkTokenError::Expired(p) => write!(f, "This {} link has expired.", label(p)),
            LinkTokenError::Invalid(p) => write!(f, "Invalid or tampered {} link.", label(p)),
            LinkTokenError::UnknownUser(_) => write!(f, "No user found for this token."),
            LinkTokenError::App(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for LinkTokenError {
    fn from(err: AppError) -> Self {
        LinkTokenError::App(err)
    }
}

impl ResponseError for LinkTokenError {
    fn error_response(&self) -> HttpResponse {
        let purpose = match self {
            LinkTokenError::App(e) => return e.error_response(),
            LinkTokenError::Expired(p) | LinkTokenError::Invalid(p) | LinkTokenError::UnknownUser(p) => *p,
        };
        let location = Self::retry_location(purpose);
        HttpResponse::build(self.status_code())
            .insert_header((header::LOCATION, location))
            .json(serde_json::json!({"error": self.to_string(), "redirect": location}))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            LinkTokenError::App(e) => e.status_code(),
            _ => StatusCode::SEE_OTHER,
        }
    }
}

#[derive(Debug, Display)]
pub enum PasswordError {
    #[display("Invalid password parameters: {_0}")]
    InvalidParameters(String),

    #[display("Password hashing failed: {_0}")]
    HashingError(String),

    #[display("Invalid password hash format: {_0}")]
    InvalidHashFormat(String),

    #[display("Password verification failed: {_0}")]
    VerificationError(String),
}

/// Why a single file in an upload batch was not ingested.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IngestError {
    #[display("File type not allowed")]
    UnsupportedType,

    #[display("File content does not look like an image or video ({_0})")]
    ContentMismatch(String),

    #[display("Conversion failed: {_0}")]
    ConversionFailed(String),

    #[display("Could not store file")]
    StorageFailed,

    #[display("Upload could not be saved")]
    CommitFailed,
}

#[derive(Debug, Display)]
pub enum TranscodeError {
    #[display("Failed to launch {_0}: {_1}")]
    Spawn(String, String),

    #[display("{_0} exited unsuccessfully: {_1}")]
    Failed(String, String),

    #[display("Could not read media duration: {_0}")]
    Probe(String),
}

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Invalid file name: {_0}")]
    InvalidName(String),

    #[display("File not found: {_0}")]
    NotFound(String),

    #[display("Storage IO error: {_0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(err.to_string())
        } else {
            StorageError::Io(err)
        }
    }
}

#[derive(Debug, Display)]
pub enum EmailError {
    #[display("Email request failed: {_0}")]
    Request(String),

    #[display("Email provider rejected message with status {_0}")]
    Rejected(u16),
}

/// Drift between relational rows and the metadata records or media files
/// that should accompany them. Always logged on the `consistency` target.
#[derive(Debug, Display)]
pub enum ConsistencyError {
    #[display("photos committed but metadata seeding failed: {reason}")]
    MetadataAfterCommit { photo_ids: Vec<uuid::Uuid>, reason: String },

    #[display("photo row removed but media file cleanup failed for {filename}: {reason}")]
    OrphanedFile { filename: String, reason: String },

    #[display("photo row {filename} has no file on disk")]
    MissingFile { filename: String },

    #[display("file {filename} on disk has no photo row")]
    UntrackedFile { filename: String },
}

impl ConsistencyError {
    /// Where in the lifecycle the drift was noticed.
    pub fn phase(&self) -> &'static str {
        match self {
            ConsistencyError::MetadataAfterCommit { .. } => "seed_comments",
            ConsistencyError::OrphanedFile { .. } => "file_cleanup",
            ConsistencyError::MissingFile { .. } | ConsistencyError::UntrackedFile { .. } => "audit",
        }
    }

    /// Logs on the `consistency` target with enough fields to repair by hand.
    pub fn report(&self, owner_id: &uuid::Uuid) {
        let phase = self.phase();
        match self {
            ConsistencyError::MetadataAfterCommit { photo_ids, reason } => tracing::error!(
                target: "consistency",
                owner_id = %owner_id,
                phase,
                photo_ids = ?photo_ids,
                reason = %reason,
                drift = %self,
                "cross-store inconsistency detected"
            ),
            ConsistencyError::OrphanedFile { filename, reason } => tracing::error!(
                target: "consistency",
                owner_id = %owner_id,
                phase,
                filename = %filename,
                reason = %reason,
                drift = %self,
                "cross-store inconsistency detected"
            ),
            ConsistencyError::MissingFile { filename } | ConsistencyError::UntrackedFile { filename } => {
                tracing::error!(
                    target: "consistency",
                    owner_id = %owner_id,
                    phase,
                    filename = %filename,
                    drift = %self,
                    "cross-store inconsistency detected"
                )
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
