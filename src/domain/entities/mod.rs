pub mod album;
pub mod media;
pub mod photo;
pub mod shared_access;
pub mod token;
pub mod user;
