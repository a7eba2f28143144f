use actix_web::web;

use crate::handlers::auth;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(auth::register)))
        .service(web::resource("/login").route(web::post().to(auth::login)))
        .service(web::resource("/refresh").route(web::post().to(auth::refresh_token)))
        .service(web::resource("/logout").route(web::post().to(auth::logout)))
        .service(web::resource("/verify/{token}").route(web::get().to(auth::verify_email)))
        .service(
            web::resource("/resend_verification")
                .route(web::post().to(auth::resend_verification))
        )
        .service(
            web::resource("/reset_password")
                .route(web::post().to(auth::request_password_reset))
        )
        .service(
            web::resource("/reset_password/{token}")
                .route(web::get().to(auth::check_reset_token))
                .route(web::post().to(auth::reset_password))
        )
        .service(web::resource("/delete_account").route(web::post().to(auth::delete_account)));
}
