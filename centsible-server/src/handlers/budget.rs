use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use centsible_common::dates;
use centsible_common::db::{self, budget::BudgetListFilter, DbThreadPool};
use centsible_common::request_io::{InputBudget, InputEditBudget, OutputBudget, OutputPage};

use crate::handlers::error::ServerError;
use crate::middleware::auth::AuthenticatedUser;
use crate::pagination;

const NO_BUDGET_MSG: &str = "No budget with given ID";

fn validate_name(name: &str) -> Result<(), ServerError> {
    if name.is_empty() || name.chars().count() > 50 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Budget name must be between 1 and 50 characters",
        ))));
    }

    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), ServerError> {
    if let Some(description) = description {
        if description.chars().count() > 200 {
            return Err(ServerError::InputRejected(Some(String::from(
                "Description must be at most 200 characters",
            ))));
        }
    }

    Ok(())
}

fn validate_planned_amount(planned_amount: f64) -> Result<(), ServerError> {
    if !planned_amount.is_finite() || planned_amount < 0.0 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Planned amount cannot be negative",
        ))));
    }

    Ok(())
}

pub async fn get_all(
    req: HttpRequest,
    db_thread_pool: web::Data<DbThreadPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let params = pagination::parse_list_params(&req)?;
    let page = params.page;

    let filter = BudgetListFilter {
        user_id: authenticated_user.user.id,
        categories: params.categories.clone(),
        month: params.month.map(dates::month_start),
    };

    let list_pool = db_thread_pool.get_ref().clone();
    let count_pool = db_thread_pool.get_ref().clone();
    let list_filter = filter.clone();
    let count_filter = filter;

    let (budgets_result, count_result) = tokio::join!(
        web::block(move || {
            let mut budget_dao = db::budget::Dao::new(&list_pool);
            budget_dao.get_budgets(&list_filter, page.offset, page.limit)
        }),
        web::block(move || {
            let mut budget_dao = db::budget::Dao::new(&count_pool);
            budget_dao.count_budgets(&count_filter)
        }),
    );

    let budgets = match budgets_result? {
        Ok(b) => b,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get budgets",
            ))));
        }
    };

    let total = match count_result? {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to count budgets",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputPage {
        meta: pagination::page_meta(&req, page, total),
        items: budgets
            .into_iter()
            .map(OutputBudget::from)
            .collect::<Vec<_>>(),
    }))
}

pub async fn create(
    db_thread_pool: web::Data<DbThreadPool>,
    budget_data: web::Json<InputBudget>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    validate_name(&budget_data.name)?;
    validate_description(budget_data.description.as_deref())?;
    validate_planned_amount(budget_data.planned_amount)?;

    let user_id = authenticated_user.user.id;

    let budget = match web::block(move || {
        let mut budget_dao = db::budget::Dao::new(&db_thread_pool);
        budget_dao.create_budget(&budget_data.0, user_id)
    })
    .await?
    {
        Ok(b) => b,
        Err(e) if e.is_unique_violation() => {
            return Err(ServerError::AlreadyExists(Some(String::from(
                "A budget with this name already exists for this month",
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to create budget",
            ))));
        }
    };

    Ok(HttpResponse::Created().json(OutputBudget::from(budget)))
}

pub async fn get(
    db_thread_pool: web::Data<DbThreadPool>,
    budget_id: web::Path<Uuid>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let budget_id = budget_id.into_inner();
    let user_id = authenticated_user.user.id;

    let budget = match web::block(move || {
        let mut budget_dao = db::budget::Dao::new(&db_thread_pool);
        budget_dao.get_budget(budget_id, user_id)
    })
    .await?
    {
        Ok(b) => b,
        Err(e) if e.is_not_found() => {
            return Err(ServerError::NotFound(Some(String::from(NO_BUDGET_MSG))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get budget",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputBudget::from(budget)))
}

pub async fn edit(
    db_thread_pool: web::Data<DbThreadPool>,
    budget_id: web::Path<Uuid>,
    budget_data: web::Json<InputEditBudget>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    if let Some(name) = &budget_data.name {
        validate_name(name)?;
    }

    validate_description(budget_data.description.as_deref())?;

    if let Some(planned_amount) = budget_data.planned_amount {
        validate_planned_amount(planned_amount)?;
    }

    let budget_id = budget_id.into_inner();
    let user_id = authenticated_user.user.id;

    let budget = match web::block(move || {
        let mut budget_dao = db::budget::Dao::new(&db_thread_pool);
        budget_dao.update_budget(budget_id, user_id, &budget_data.0)
    })
    .await?
    {
        Ok(b) => b,
        Err(e) if e.is_not_found() => {
            return Err(ServerError::NotFound(Some(String::from(NO_BUDGET_MSG))));
        }
        Err(e) if e.is_unique_violation() => {
            return Err(ServerError::AlreadyExists(Some(String::from(
                "A budget with this name already exists for this month",
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to edit budget",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputBudget::from(budget)))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    budget_id: web::Path<Uuid>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let budget_id = budget_id.into_inner();
    let user_id = authenticated_user.user.id;

    let affected_rows = match web::block(move || {
        let mut budget_dao = db::budget::Dao::new(&db_thread_pool);
        budget_dao.delete_budget(budget_id, user_id)
    })
    .await?
    {
        Ok(count) => count,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to delete budget",
            ))));
        }
    };

    if affected_rows == 0 {
        return Err(ServerError::NotFound(Some(String::from(NO_BUDGET_MSG))));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_bounds() {
        assert!(validate_name("Groceries").is_ok());
        assert!(validate_name(&"a".repeat(50)).is_ok());

        assert!(matches!(
            validate_name(""),
            Err(ServerError::InputRejected(_))
        ));
        assert!(matches!(
            validate_name(&"a".repeat(51)),
            Err(ServerError::InputRejected(_))
        ));
    }

    #[test]
    fn test_validate_description_bounds() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("weekly shop")).is_ok());
        assert!(validate_description(Some(&"a".repeat(200))).is_ok());

        assert!(matches!(
            validate_description(Some(&"a".repeat(201))),
            Err(ServerError::InputRejected(_))
        ));
    }

    #[test]
    fn test_validate_planned_amount_rejects_negative_and_non_finite() {
        assert!(validate_planned_amount(0.0).is_ok());
        assert!(validate_planned_amount(499.99).is_ok());

        assert!(validate_planned_amount(-0.01).is_err());
        assert!(validate_planned_amount(f64::NAN).is_err());
        assert!(validate_planned_amount(f64::INFINITY).is_err());
    }
}
