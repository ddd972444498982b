use actix_web::web;

mod auth;
mod budget;
mod transaction;
mod user;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::configure)
        .configure(budget::configure)
        .configure(transaction::configure)
        .configure(user::configure)
        .route("/health", web::get().to(handlers::health::heartbeat));
}
