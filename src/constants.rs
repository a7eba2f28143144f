use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "heic"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Still-image containers that are converted to JPEG before storage.
pub const CONVERTED_EXTENSIONS: &[&str] = &["heic"];

pub const THUMBNAIL_WIDTH: u32 = 320;

pub const EMAIL_TOKEN_MAX_AGE_SECS: i64 = 3600;

pub const ALBUM_TITLE_MAX: usize = 50;
pub const TAG_MAX: usize = 50;
pub const COMMENT_MAX: usize = 1000;
pub const DESCRIPTION_MAX: usize = 2000;

pub const ALBUM_PREVIEW_COUNT: usize = 5;

/// Files younger than this may belong to an upload that has not committed yet.
pub const AUDIT_GRACE_SECS: u64 = 15 * 60;
