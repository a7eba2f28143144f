pub mod album;
pub mod metadata;
pub mod photo;
pub mod shared_access;
pub mod sqlx_repo;
pub mod token;
pub mod user;
