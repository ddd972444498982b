use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::get().to(handlers::user::me))
            .service(web::resource("").route(web::get().to(handlers::user::get_all)))
            .service(
                web::resource("/{user_id}").route(web::delete().to(handlers::user::delete)),
            ),
    );
}
