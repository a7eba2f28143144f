use actix_web::web;

use crate::handlers::share;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/share")
            .route(web::post().to(share::share))
            .route(web::get().to(share::list_grants))
    )
    .service(
        web::resource("/share/{shared_user_id}")
            .route(web::delete().to(share::revoke))
    );
}
