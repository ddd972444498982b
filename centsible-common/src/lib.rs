#[macro_use]
extern crate diesel;

pub mod dates;
pub mod db;
pub mod models;
pub mod password_hasher;
pub mod request_io;
pub mod revocation;
pub mod schema;
pub mod token;
pub mod validators;
