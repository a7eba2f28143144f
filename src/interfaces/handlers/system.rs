use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{
    sync::RwLock,
    time::Duration,
};

use crate::{constants::START_TIME, repositories::user::UserRepository, AppState};

#[derive(Serialize, Clone)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    redis_status: String,
    version: String,
}

const PROBE_INTERVAL_SECS: i64 = 5;

/// Last probe result and when it was taken.
static LAST_PROBE: Lazy<RwLock<Option<(i64, HealthCheckResponse)>>> = Lazy::new(|| RwLock::new(None));

async fn build_health_response(state: &AppState) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let db_ok = state.auth_handler.user_repo.check_connection().await.is_ok();

    let redis_status = match &state.token_store {
        Some(store) if store.ping().await => "OK",
        Some(_) => "Unavailable",
        None => "Not configured",
    };

    HealthCheckResponse {
        status: if db_ok { "healthy" } else { "degraded" }.to_string(),
        uptime: format_duration(Duration::from_secs(uptime_secs)).to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database: if db_ok { "OK" } else { "Unavailable" }.to_string(),
        redis_status: redis_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Re-probes dependencies at most every five seconds.
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();

    let cached = LAST_PROBE
        .read()
        .ok()
        .and_then(|guard| guard.clone())
        .filter(|(taken_at, _)| now - taken_at <= PROBE_INTERVAL_SECS);

    let response = match cached {
        Some((_, response)) => response,
        None => {
            let response = build_health_response(&state).await;
            match LAST_PROBE.write() {
                Ok(mut slot) => *slot = Some((now, response.clone())),
                Err(e) => tracing::warn!("Health probe cache lock poisoned: {}", e),
            }
            response
        }
    };

    HttpResponse::Ok().json(response)
}
