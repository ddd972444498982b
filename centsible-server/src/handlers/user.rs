use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use centsible_common::db::{self, DbThreadPool};
use centsible_common::request_io::{OutputPage, OutputUser};

use crate::handlers::error::ServerError;
use crate::middleware::auth::{AdminUser, AuthenticatedUser};
use crate::pagination;

pub async fn me(authenticated_user: AuthenticatedUser) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(OutputUser::from(authenticated_user.user)))
}

pub async fn get_all(
    req: HttpRequest,
    db_thread_pool: web::Data<DbThreadPool>,
    _admin_user: AdminUser,
) -> Result<HttpResponse, ServerError> {
    let params = pagination::parse_list_params(&req)?;
    let page = params.page;

    let list_pool = db_thread_pool.get_ref().clone();
    let count_pool = db_thread_pool.get_ref().clone();

    let (users_result, count_result) = tokio::join!(
        web::block(move || {
            let mut user_dao = db::user::Dao::new(&list_pool);
            user_dao.get_users(page.offset, page.limit)
        }),
        web::block(move || {
            let mut user_dao = db::user::Dao::new(&count_pool);
            user_dao.count_users()
        }),
    );

    let users = match users_result? {
        Ok(u) => u,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get users",
            ))));
        }
    };

    let total = match count_result? {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to count users",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputPage {
        meta: pagination::page_meta(&req, page, total),
        items: users.into_iter().map(OutputUser::from).collect::<Vec<_>>(),
    }))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    user_id: web::Path<Uuid>,
    _admin_user: AdminUser,
) -> Result<HttpResponse, ServerError> {
    let user_id = user_id.into_inner();

    let affected_rows = match web::block(move || {
        let mut user_dao = db::user::Dao::new(&db_thread_pool);
        user_dao.delete_user(user_id)
    })
    .await?
    {
        Ok(count) => count,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to delete user",
            ))));
        }
    };

    if affected_rows == 0 {
        return Err(ServerError::NotFound(Some(String::from(
            "No user with given ID",
        ))));
    }

    Ok(HttpResponse::NoContent().finish())
}
