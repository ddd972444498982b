use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use centsible_common::db::{self, DaoError, DbThreadPool};
use centsible_common::models::user::User;
use centsible_common::revocation::{RedisPool, Registry};
use centsible_common::token::{self, TokenClaims};

use crate::env;
use crate::handlers::error::ServerError;

/// The fully-authenticated caller: bearer token parsed, signature and
/// expiry verified, revocation registry consulted, and the subject resolved
/// to a live user row. Any protected handler takes this as an extractor.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: TokenClaims,
    pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Result<String, ServerError> {
    const INVALID_TOKEN_MSG: &str = "Token is invalid";

    let auth_header = match req.headers().get("Authorization") {
        Some(header) => header,
        None => {
            return Err(ServerError::UserUnauthorized(Some(String::from(
                "No token provided",
            ))))
        }
    };

    let mut header_parts_iter = match auth_header.to_str() {
        Ok(h) => h,
        Err(_) => {
            return Err(ServerError::UserUnauthorized(Some(String::from(
                INVALID_TOKEN_MSG,
            ))))
        }
    }
    .split_ascii_whitespace();

    match header_parts_iter.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => (),
        _ => {
            return Err(ServerError::UserUnauthorized(Some(String::from(
                INVALID_TOKEN_MSG,
            ))))
        }
    }

    match header_parts_iter.next() {
        Some(token) => Ok(String::from(token)),
        None => Err(ServerError::UserUnauthorized(Some(String::from(
            INVALID_TOKEN_MSG,
        )))),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = bearer_token(&req)?;

            let claims = token::validate_access_token(
                &token,
                &env::CONF.keys.token_signing_key,
                env::CONF.keys.token_signing_algorithm,
            )?;

            let redis_pool = match req.app_data::<web::Data<RedisPool>>() {
                Some(pool) => pool.get_ref().clone(),
                None => {
                    return Err(ServerError::InternalError(Some(String::from(
                        "Revocation registry is not configured",
                    ))))
                }
            };

            let is_banned = match Registry::new(&redis_pool).is_banned(&token).await {
                Ok(b) => b,
                Err(e) => {
                    log::error!("{e}");
                    return Err(ServerError::InternalError(Some(String::from(
                        "Failed to check token revocation",
                    ))));
                }
            };

            if is_banned {
                return Err(ServerError::UserUnauthorized(Some(String::from(
                    "Token has been revoked",
                ))));
            }

            let db_thread_pool = match req.app_data::<web::Data<DbThreadPool>>() {
                Some(pool) => pool.get_ref().clone(),
                None => {
                    return Err(ServerError::InternalError(Some(String::from(
                        "Database pool is not configured",
                    ))))
                }
            };

            let username = claims.sub.clone();
            let user = match web::block(move || {
                let mut user_dao = db::user::Dao::new(&db_thread_pool);
                user_dao.get_user_by_username(&username)
            })
            .await?
            {
                Ok(u) => u,
                Err(e) if e.is_not_found() => {
                    return Err(ServerError::UserUnauthorized(Some(String::from(
                        "User no longer exists",
                    ))));
                }
                Err(e) => {
                    log::error!("{e}");
                    return Err(ServerError::DatabaseTransactionError(Some(String::from(
                        "Failed to look up user",
                    ))));
                }
            };

            Ok(AuthenticatedUser {
                user,
                claims,
                token,
            })
        })
    }
}

/// An `AuthenticatedUser` whose account carries the admin flag; everyone
/// else gets 403.
#[derive(Debug)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
    type Error = ServerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let authenticated_future = AuthenticatedUser::from_request(req, payload);

        Box::pin(async move {
            let authenticated_user = authenticated_future.await?;

            if !authenticated_user.user.is_admin {
                return Err(ServerError::AccessForbidden(Some(String::from(
                    "User does not have admin privileges",
                ))));
            }

            Ok(AdminUser(authenticated_user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::test;

    #[actix_rt::test]
    async fn test_request_without_auth_header_is_rejected() {
        let req = test::TestRequest::get().to_http_request();

        let res = AuthenticatedUser::from_request(&req, &mut Payload::None).await;

        assert!(matches!(res, Err(ServerError::UserUnauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_header_without_bearer_keyword_is_rejected() {
        let req = test::TestRequest::get()
            .insert_header(("authorization", "some-token-value"))
            .to_http_request();

        let res = AuthenticatedUser::from_request(&req, &mut Payload::None).await;

        assert!(matches!(res, Err(ServerError::UserUnauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_header_without_token_is_rejected() {
        let req = test::TestRequest::get()
            .insert_header(("authorization", "bearer"))
            .to_http_request();

        let res = AuthenticatedUser::from_request(&req, &mut Payload::None).await;

        assert!(matches!(res, Err(ServerError::UserUnauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_garbage_token_is_rejected() {
        let req = test::TestRequest::get()
            .insert_header(("authorization", "Bearer not-a-real-token"))
            .to_http_request();

        let res = AuthenticatedUser::from_request(&req, &mut Payload::None).await;

        assert!(matches!(res, Err(ServerError::UserUnauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_admin_extractor_rejects_unauthenticated_requests() {
        let req = test::TestRequest::get().to_http_request();

        let res = AdminUser::from_request(&req, &mut Payload::None).await;

        assert!(matches!(res, Err(ServerError::UserUnauthorized(_))));
    }
}
