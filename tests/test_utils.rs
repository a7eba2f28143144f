#![allow(dead_code)]

use actix_multipart::form::MultipartFormConfig;
use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use photo_gallery::{
    db::postgres::{create_pool, run_migrations},
    entities::{
        token::AuthResponse,
        user::{LoginUser, NewUser, User},
    },
    media::storage::MediaStorage,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use reqwest::{multipart, redirect::Policy, Client};
use serde::Serialize;
use sqlx::PgPool;
use std::{net::TcpListener, time::Duration};
use tempfile::TempDir;

use crate::{support::test_config, test_user::TestUser};

/// The real application on an ephemeral port, backed by `TEST_DATABASE_URL`.
pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub client: Client,
    pub config: AppConfig,
    _media_root: TempDir,
}

impl TestApp {
    /// `None` when no test database is configured; callers skip.
    pub async fn spawn() -> Option<Self> {
        if std::env::var("TEST_DATABASE_URL").map(|u| u.is_empty()).unwrap_or(true) {
            eprintln!("TEST_DATABASE_URL not set, skipping database-backed test");
            return None;
        }

        let media_root = tempfile::tempdir().expect("Failed to create media root");
        let config = test_config(media_root.path());

        let db_pool = create_pool(&config.database_url)
            .await
            .expect("Failed to create test DB pool");

        run_migrations(&db_pool)
            .await
            .expect("Failed to run migrations");

        MediaStorage::new(config.upload_dir.clone(), config.thumbnail_dir.clone())
            .ensure_roots()
            .await
            .expect("Failed to create media directories");

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state = web::Data::new(AppState::new(&config, db_pool.clone()));
        let upload_limit = config.max_upload_bytes();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .app_data(MultipartFormConfig::default().total_limit(upload_limit))
                .wrap(AuthMiddleware)
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(1)
        .run();

        tokio::spawn(server);

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Some(Self {
            address,
            db_pool,
            client,
            config,
            _media_root: media_root,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, token: &str, body: &T) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("DELETE failed")
    }

    /// Multipart upload of `(filename, bytes)` pairs, optionally into an album.
    pub async fn upload(&self, token: &str, files: &[(&str, &[u8])], album: Option<&str>) -> reqwest::Response {
        let mut form = multipart::Form::new();
        for (name, bytes) in files {
            let part = multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string());
            form = form.part("photos", part);
        }
        if let Some(title) = album {
            form = form.text("new_album", title.to_string());
        }

        self.client
            .post(self.url("/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Upload failed")
    }
}

#[async_trait]
pub trait AuthTestHelpers: Send + Sync {
    async fn register_user(&self, user: &NewUser) -> reqwest::Response;
    async fn create_verified_user(&self, prefix: &str) -> (User, String);
    async fn login_user(&self, credentials: &LoginUser) -> AuthResponse;
}

#[async_trait]
impl AuthTestHelpers for TestApp {
    async fn register_user(&self, user: &NewUser) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .json(user)
            .send()
            .await
            .expect("Failed to register user")
    }

    /// Inserts a verified account and returns it with a fresh access token.
    async fn create_verified_user(&self, prefix: &str) -> (User, String) {
        let fixture = TestUser::new(prefix).verified();
        let user = fixture.insert(&self.db_pool).await;
        let tokens = self.login_user(&fixture.login()).await;
        (user, tokens.access_token)
    }

    async fn login_user(&self, credentials: &LoginUser) -> AuthResponse {
        let response = self.client
            .post(self.url("/login"))
            .json(credentials)
            .send()
            .await
            .expect("Failed to login user");

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            panic!("Login failed: ({}): {}", status, body);
        }

        response.json().await.expect("Failed to parse login response")
    }
}
