use actix_web::{web, HttpResponse};
use tokio::sync::oneshot;

use centsible_common::db::{self, DbThreadPool};
use centsible_common::models::user::User;
use centsible_common::password_hasher::{self, HashParams};
use centsible_common::request_io::{CredentialPair, InputUser, OutputToken};
use centsible_common::revocation::{RedisPool, Registry, RevocationError};
use centsible_common::token::{self, TokenParams};
use centsible_common::validators::Validity;

use crate::env;
use crate::handlers::error::ServerError;
use crate::middleware::auth::AuthenticatedUser;

fn conf_hash_params() -> HashParams {
    HashParams {
        salt_length: env::CONF.hashing.salt_length,
        hash_length: env::CONF.hashing.hash_length,
        iterations: env::CONF.hashing.hash_iterations,
        memory_cost_kib: env::CONF.hashing.hash_mem_cost_kib,
        threads: env::CONF.hashing.hash_threads,
    }
}

fn generate_token_for(user: &User) -> Result<String, ServerError> {
    match token::generate_access_token(
        TokenParams {
            user_id: &user.id,
            username: &user.username,
        },
        &env::CONF.keys.token_signing_key,
        env::CONF.keys.token_signing_algorithm,
        env::CONF.lifetimes.access_token_lifetime,
    ) {
        Ok(t) => Ok(t),
        Err(e) => {
            log::error!("{e}");
            Err(ServerError::InternalError(Some(String::from(
                "Failed to generate access token",
            ))))
        }
    }
}

pub async fn sign_up(
    db_thread_pool: web::Data<DbThreadPool>,
    user_data: web::Json<InputUser>,
) -> Result<HttpResponse, ServerError> {
    if let Validity::Invalid(msg) = user_data.validate_email_address() {
        return Err(ServerError::InvalidFormat(Some(msg)));
    }

    if user_data.username.is_empty() || user_data.username.chars().count() > 100 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Username must be between 1 and 100 characters",
        ))));
    }

    if user_data.password.chars().count() < 8 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Password must be at least 8 characters",
        ))));
    }

    if user_data.password != user_data.password2 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Passwords don't match",
        ))));
    }

    let password = user_data.password.clone();
    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let hash_result =
            password_hasher::hash_password(&password, &conf_hash_params(), &env::CONF.keys.hashing_key);

        sender.send(hash_result).expect("Sending to channel failed");
    });

    let password_hash = match receiver.await? {
        Ok(h) => h,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::InternalError(Some(String::from(
                "Failed to hash password",
            ))));
        }
    };

    let user = match web::block(move || {
        let mut user_dao = db::user::Dao::new(&db_thread_pool);
        user_dao.create_user(&user_data.username, &user_data.email, &password_hash)
    })
    .await?
    {
        Ok(u) => u,
        Err(e) if e.is_unique_violation() => {
            return Err(ServerError::AlreadyExists(Some(String::from(
                "username and/or email is not available",
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to create user",
            ))));
        }
    };

    let access_token = generate_token_for(&user)?;

    Ok(HttpResponse::Created().json(OutputToken::bearer(access_token)))
}

pub async fn sign_in(
    db_thread_pool: web::Data<DbThreadPool>,
    credentials: web::Form<CredentialPair>,
) -> Result<HttpResponse, ServerError> {
    const INVALID_CREDENTIALS_MSG: &str = "Incorrect username or password";

    let username = credentials.username.clone();

    let user = match web::block(move || {
        let mut user_dao = db::user::Dao::new(&db_thread_pool);
        user_dao.get_user_by_username(&username)
    })
    .await?
    {
        Ok(u) => u,
        Err(e) if e.is_not_found() => {
            // Hash the provided password anyway so an attacker can't tell an
            // unknown username from a wrong password by response timing
            let password = if credentials.password.is_empty() {
                String::from(" ")
            } else {
                credentials.password.clone()
            };

            let (sender, receiver) = oneshot::channel();

            rayon::spawn(move || {
                let _ = password_hasher::hash_password(
                    &password,
                    &conf_hash_params(),
                    &env::CONF.keys.hashing_key,
                );
                let _ = sender.send(());
            });

            let _ = receiver.await;

            return Err(ServerError::UserUnauthorized(Some(String::from(
                INVALID_CREDENTIALS_MSG,
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to look up user",
            ))));
        }
    };

    let password = credentials.password.clone();
    let password_hash = user.password_hash.clone();
    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let does_match =
            password_hasher::verify_password(&password, &password_hash, &env::CONF.keys.hashing_key);

        sender.send(does_match).expect("Sending to channel failed");
    });

    if !receiver.await? {
        return Err(ServerError::UserUnauthorized(Some(String::from(
            INVALID_CREDENTIALS_MSG,
        ))));
    }

    let access_token = generate_token_for(&user)?;

    Ok(HttpResponse::Ok().json(OutputToken::bearer(access_token)))
}

/// Puts the caller's token on the revocation registry for exactly as long
/// as the token would otherwise have remained valid.
pub async fn sign_out(
    redis_pool: web::Data<RedisPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let remaining_lifetime = authenticated_user.claims.remaining_lifetime();

    match Registry::new(redis_pool.get_ref())
        .ban_token(&authenticated_user.token, "signout", remaining_lifetime)
        .await
    {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(RevocationError::AlreadyBanned) => Err(ServerError::UserUnauthorized(Some(
            String::from("Token has already been revoked"),
        ))),
        Err(e) => {
            log::error!("{e}");
            Err(ServerError::InternalError(Some(String::from(
                "Failed to revoke token",
            ))))
        }
    }
}
