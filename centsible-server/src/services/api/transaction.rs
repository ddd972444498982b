use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Creation posts to the owning budget's ID; the remaining item routes
    // take a transaction ID. Same position in the path, so one resource.
    cfg.service(
        web::scope("/transactions")
            .service(web::resource("").route(web::get().to(handlers::transaction::get_all)))
            .service(
                web::resource("/{id}")
                    .route(web::post().to(handlers::transaction::create))
                    .route(web::get().to(handlers::transaction::get))
                    .route(web::patch().to(handlers::transaction::edit))
                    .route(web::delete().to(handlers::transaction::delete)),
            ),
    );
}
