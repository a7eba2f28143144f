use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SharedAccess {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub shared_user_id: Uuid,
    pub alias: String,
    pub can_upload: bool,
    pub can_comment: bool,
    pub require_upload_approval: bool,
    pub require_comment_approval: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SharedAccessInsert {
    pub owner_id: Uuid,
    pub shared_user_id: Uuid,
    pub alias: String,
    pub can_upload: bool,
    pub can_comment: bool,
}

/// A grant joined with the username on the other side of it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GrantView {
    pub owner_id: Uuid,
    pub shared_user_id: Uuid,
    pub counterpart_username: String,
    pub alias: String,
    pub can_upload: bool,
    pub can_comment: bool,
    pub require_upload_approval: bool,
    pub require_comment_approval: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ShareRequest {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,

    #[validate(length(max = 80, message = "Alias must be at most 80 characters"))]
    pub alias: Option<String>,

    #[serde(default = "default_true")]
    pub can_upload: bool,

    #[serde(default = "default_true")]
    pub can_comment: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GrantList {
    pub outgoing: Vec<GrantView>,
    pub incoming: Vec<GrantView>,
}
