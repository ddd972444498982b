use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(handlers::auth::sign_up))
            .route("/signin", web::post().to(handlers::auth::sign_in))
            .route("/signout", web::post().to(handlers::auth::sign_out)),
    );
}
