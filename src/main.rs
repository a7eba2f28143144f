use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use photo_gallery::{
    background_task::start_audit_task,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    media::storage::MediaStorage,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing(production: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    if production {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.is_production());
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = create_pool(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("database unavailable: {e}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;

    let storage = MediaStorage::new(config.upload_dir.clone(), config.thumbnail_dir.clone());
    storage
        .ensure_roots()
        .await
        .map_err(|e| std::io::Error::other(format!("media directories unavailable: {e}")))?;

    let app_state = web::Data::new(AppState::new(&config, pool.clone()));

    let server_addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let cors_origins = config.cors_origins();
    let upload_limit = config.max_upload_bytes();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(MultipartFormConfig::default().total_limit(upload_limit))
            .wrap(AuthMiddleware)
            .wrap(build_cors(&cors_origins))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::spawn(start_audit_task(
        photo_gallery::repositories::sqlx_repo::SqlxRepo::new(pool),
        storage,
        config.audit_interval_hours,
    ));

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
