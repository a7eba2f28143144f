pub mod auth;
pub mod cache;
pub mod db;
pub mod email;
pub mod media;
pub mod utils;
