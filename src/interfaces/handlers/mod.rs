pub mod albums;
pub mod auth;
pub mod comments;
pub mod gallery;
pub mod media;
pub mod share;
pub mod system;
pub mod tags;
pub mod upload;
