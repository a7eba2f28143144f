mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, password, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, cache, db, email, media, utils};

use auth::jwt::JwtService;
use cache::token_store::TokenDenylist;
use email::sender::ConfiguredEmailSender;
use media::{storage::MediaStorage, transcoder::FfmpegTranscoder};
use repositories::sqlx_repo::SqlxRepo;
use use_cases::{
    account::AccountHandler, albums::AlbumHandler, auth::AuthHandler, comments::CommentHandler,
    gallery::GalleryHandler, ingest::IngestHandler, sharing::ShareHandler, tags::TagHandler,
};

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub account_handler: AccountHandler<SqlxRepo>,
    pub gallery_handler: GalleryHandler<SqlxRepo, SqlxRepo>,
    pub ingest_handler: AppIngestHandler,
    pub album_handler: AlbumHandler<SqlxRepo, SqlxRepo>,
    pub tag_handler: TagHandler<SqlxRepo, SqlxRepo>,
    pub comment_handler: CommentHandler<SqlxRepo, SqlxRepo>,
    pub share_handler: ShareHandler<SqlxRepo>,
    pub token_store: Option<TokenDenylist>,
}

pub type AppAuthHandler = AuthHandler<SqlxRepo, JwtService, ConfiguredEmailSender>;
pub type AppIngestHandler = IngestHandler<SqlxRepo, SqlxRepo, FfmpegTranscoder>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let repo = SqlxRepo::new(pool);
        let storage = MediaStorage::new(config.upload_dir.clone(), config.thumbnail_dir.clone());

        let auth_handler = AuthHandler::new(
            repo.clone(),
            JwtService::new(config),
            ConfiguredEmailSender::from_config(config),
            config.public_base_url.clone(),
        );

        let token_store = config.redis_url.as_ref().and_then(|url| {
            TokenDenylist::open(url.as_str())
                .map_err(|e| tracing::error!("Redis connection error: {}", e))
                .ok()
        });

        AppState {
            auth_handler,
            account_handler: AccountHandler::new(repo.clone(), storage.clone()),
            gallery_handler: GalleryHandler::new(repo.clone(), repo.clone(), storage.clone()),
            ingest_handler: IngestHandler::new(repo.clone(), repo.clone(), FfmpegTranscoder::new(config), storage),
            album_handler: AlbumHandler::new(repo.clone(), repo.clone()),
            tag_handler: TagHandler::new(repo.clone(), repo.clone()),
            comment_handler: CommentHandler::new(repo.clone(), repo.clone()),
            share_handler: ShareHandler::new(repo),
            token_store,
        }
    }
}
