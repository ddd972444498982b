use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/budgets")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::budget::get_all))
                    .route(web::post().to(handlers::budget::create)),
            )
            .service(
                web::resource("/{budget_id}")
                    .route(web::get().to(handlers::budget::get))
                    .route(web::patch().to(handlers::budget::edit))
                    .route(web::delete().to(handlers::budget::delete)),
            ),
    );
}
