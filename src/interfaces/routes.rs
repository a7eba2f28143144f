use actix_web::web;

use crate::handlers::system::health_check;

mod albums;
mod auth;
mod gallery;
mod json_error;
mod share;
mod tags;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));

    cfg.configure(auth::config_routes)
        .configure(gallery::config_routes)
        .configure(albums::config_routes)
        .configure(tags::config_routes)
        .configure(share::config_routes);

    cfg.configure(json_error::config_routes);
}
