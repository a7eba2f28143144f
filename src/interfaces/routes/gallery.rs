use actix_web::web;

use crate::handlers::{gallery, media, upload};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(gallery::gallery)))
        .service(web::resource("/upload").route(web::post().to(upload::upload)))
        .service(
            web::resource("/description/{filename}")
                .route(web::post().to(gallery::update_description))
        )
        .service(
            web::resource("/delete/{filename}")
                .route(web::post().to(gallery::delete_photo))
                .route(web::delete().to(gallery::delete_photo))
        )
        .service(web::resource("/uploads/{filename}").route(web::get().to(media::serve_upload)))
        .service(web::resource("/thumbnails/{filename}").route(web::get().to(media::serve_thumbnail)))
        .service(web::resource("/download/{filename}").route(web::get().to(media::download)));
}
