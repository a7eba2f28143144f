pub mod access;
pub mod account;
pub mod albums;
pub mod auth;
pub mod comments;
pub mod extractors;
pub mod gallery;
pub mod ingest;
pub mod sharing;
pub mod tags;
