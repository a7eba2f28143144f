use actix_web::web;

use crate::handlers::{comments, tags};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/add_tag").route(web::post().to(tags::add_tag)))
        .service(web::resource("/remove_tag").route(web::post().to(tags::remove_tag)))
        .service(
            web::resource("/rename_tag_single")
                .route(web::post().to(tags::rename_tag_single))
        )
        .service(
            web::resource("/rename_tag_global")
                .route(web::post().to(tags::rename_tag_global))
        )
        .service(
            web::resource("/add_comment/{filename}")
                .route(web::post().to(comments::add_comment))
        );
}
