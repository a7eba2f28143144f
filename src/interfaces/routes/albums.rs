use actix_web::web;

use crate::handlers::albums;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/albums").route(web::get().to(albums::list_albums)))
        .service(web::resource("/album/{title}").route(web::get().to(albums::view_album)))
        .service(web::resource("/create_album").route(web::post().to(albums::create_album)))
        .service(
            web::resource("/rename_album/{title}")
                .route(web::post().to(albums::rename_album))
        )
        .service(web::resource("/delete_album").route(web::post().to(albums::delete_album)))
        .service(
            web::resource("/toggle_favorite_album")
                .route(web::post().to(albums::toggle_favorite))
        );
}
