use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use uuid::Uuid;

use centsible_common::dates::{self, DateRange};
use centsible_common::db::{self, transaction::TransactionListFilter, DbThreadPool};
use centsible_common::models::budget::Budget;
use centsible_common::request_io::{
    InputEditTransaction, InputTransaction, OutputPage, OutputTransaction,
};

use crate::handlers::error::ServerError;
use crate::middleware::auth::AuthenticatedUser;
use crate::pagination;

const NO_BUDGET_MSG: &str = "No budget with given ID";
const NO_TRANSACTION_MSG: &str = "No transaction with given ID";

fn validate_amount(amount: f64) -> Result<(), ServerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Amount must be positive",
        ))));
    }

    Ok(())
}

fn validate_description(description: &str) -> Result<(), ServerError> {
    if description.is_empty() || description.chars().count() > 100 {
        return Err(ServerError::InputRejected(Some(String::from(
            "Description must be between 1 and 100 characters",
        ))));
    }

    Ok(())
}

fn validate_date_in_budget_month(date: NaiveDate, budget: &Budget) -> Result<(), ServerError> {
    let budget_month = dates::month_range(budget.month);

    if date < budget_month.start || date > budget_month.end {
        return Err(ServerError::InputRejected(Some(String::from(
            "Transaction date falls outside the budget's month",
        ))));
    }

    Ok(())
}

async fn resolve_budget(
    db_thread_pool: &web::Data<DbThreadPool>,
    budget_id: Uuid,
    user_id: Uuid,
) -> Result<Budget, ServerError> {
    let pool = db_thread_pool.get_ref().clone();

    match web::block(move || {
        let mut budget_dao = db::budget::Dao::new(&pool);
        budget_dao.get_budget(budget_id, user_id)
    })
    .await?
    {
        Ok(b) => Ok(b),
        Err(e) if e.is_not_found() => Err(ServerError::NotFound(Some(String::from(NO_BUDGET_MSG)))),
        Err(e) => {
            log::error!("{e}");
            Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get budget",
            ))))
        }
    }
}

pub async fn get_all(
    req: HttpRequest,
    db_thread_pool: web::Data<DbThreadPool>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let params = pagination::parse_list_params(&req)?;
    let page = params.page;

    // The date range defaults to the current month, one bound at a time
    let default_range = dates::current_month_range();
    let date_range = DateRange {
        start: params.start.unwrap_or(default_range.start),
        end: params.end.unwrap_or(default_range.end),
    };

    if date_range.start > date_range.end {
        return Err(ServerError::InputRejected(Some(String::from(
            "'start' must not be after 'end'",
        ))));
    }

    let filter = TransactionListFilter {
        user_id: authenticated_user.user.id,
        categories: params.categories.clone(),
        date_range,
    };

    let list_pool = db_thread_pool.get_ref().clone();
    let count_pool = db_thread_pool.get_ref().clone();
    let list_filter = filter.clone();
    let count_filter = filter;

    let (transactions_result, count_result) = tokio::join!(
        web::block(move || {
            let mut transaction_dao = db::transaction::Dao::new(&list_pool);
            transaction_dao.get_transactions(&list_filter, page.offset, page.limit)
        }),
        web::block(move || {
            let mut transaction_dao = db::transaction::Dao::new(&count_pool);
            transaction_dao.count_transactions(&count_filter)
        }),
    );

    let transaction_rows = match transactions_result? {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get transactions",
            ))));
        }
    };

    let total = match count_result? {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to count transactions",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputPage {
        meta: pagination::page_meta(&req, page, total),
        items: transaction_rows
            .into_iter()
            .map(|(transaction, category, budget_name)| {
                OutputTransaction::from_parts(transaction, category, budget_name)
            })
            .collect::<Vec<_>>(),
    }))
}

pub async fn create(
    db_thread_pool: web::Data<DbThreadPool>,
    budget_id: web::Path<Uuid>,
    transaction_data: web::Json<InputTransaction>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    validate_amount(transaction_data.amount)?;
    validate_description(&transaction_data.description)?;

    let budget = resolve_budget(
        &db_thread_pool,
        budget_id.into_inner(),
        authenticated_user.user.id,
    )
    .await?;

    let date = transaction_data.date.unwrap_or_else(dates::today);
    validate_date_in_budget_month(date, &budget)?;

    let budget_for_insert = budget.clone();
    let transaction = match web::block(move || {
        let mut transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.create_transaction(&transaction_data.0, date, &budget_for_insert)
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to create transaction",
            ))));
        }
    };

    Ok(HttpResponse::Created().json(OutputTransaction::from_parts(
        transaction,
        budget.category,
        budget.name,
    )))
}

pub async fn get(
    db_thread_pool: web::Data<DbThreadPool>,
    transaction_id: web::Path<Uuid>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = transaction_id.into_inner();
    let user_id = authenticated_user.user.id;

    let (transaction, category, budget_name) = match web::block(move || {
        let mut transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.get_transaction(transaction_id, user_id)
    })
    .await?
    {
        Ok(row) => row,
        Err(e) if e.is_not_found() => {
            return Err(ServerError::NotFound(Some(String::from(
                NO_TRANSACTION_MSG,
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get transaction",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputTransaction::from_parts(
        transaction,
        category,
        budget_name,
    )))
}

/// Validates everything before writing anything: if the new date (or the
/// existing one) is inconsistent with the effective budget's month, the
/// whole update is rejected and no field changes.
pub async fn edit(
    db_thread_pool: web::Data<DbThreadPool>,
    transaction_id: web::Path<Uuid>,
    transaction_data: web::Json<InputEditTransaction>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    if let Some(amount) = transaction_data.amount {
        validate_amount(amount)?;
    }

    if let Some(description) = &transaction_data.description {
        validate_description(description)?;
    }

    let transaction_id = transaction_id.into_inner();
    let user_id = authenticated_user.user.id;

    let lookup_pool = db_thread_pool.get_ref().clone();
    let (existing_transaction, _, _) = match web::block(move || {
        let mut transaction_dao = db::transaction::Dao::new(&lookup_pool);
        transaction_dao.get_transaction(transaction_id, user_id)
    })
    .await?
    {
        Ok(row) => row,
        Err(e) if e.is_not_found() => {
            return Err(ServerError::NotFound(Some(String::from(
                NO_TRANSACTION_MSG,
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to get transaction",
            ))));
        }
    };

    let target_budget_id = transaction_data
        .budget_id
        .unwrap_or(existing_transaction.budget_id);

    let target_budget = resolve_budget(&db_thread_pool, target_budget_id, user_id).await?;

    let effective_date = transaction_data.date.unwrap_or(existing_transaction.date);
    validate_date_in_budget_month(effective_date, &target_budget)?;

    let updated_transaction = match web::block(move || {
        let mut transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.update_transaction(transaction_id, user_id, &transaction_data.0)
    })
    .await?
    {
        Ok(t) => t,
        Err(e) if e.is_not_found() => {
            return Err(ServerError::NotFound(Some(String::from(
                NO_TRANSACTION_MSG,
            ))));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to edit transaction",
            ))));
        }
    };

    Ok(HttpResponse::Ok().json(OutputTransaction::from_parts(
        updated_transaction,
        target_budget.category,
        target_budget.name,
    )))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    transaction_id: web::Path<Uuid>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = transaction_id.into_inner();
    let user_id = authenticated_user.user.id;

    let affected_rows = match web::block(move || {
        let mut transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.delete_transaction(transaction_id, user_id)
    })
    .await?
    {
        Ok(count) => count,
        Err(e) => {
            log::error!("{e}");
            return Err(ServerError::DatabaseTransactionError(Some(String::from(
                "Failed to delete transaction",
            ))));
        }
    };

    if affected_rows == 0 {
        return Err(ServerError::NotFound(Some(String::from(
            NO_TRANSACTION_MSG,
        ))));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    use centsible_common::models::budget::BudgetCategory;
    use chrono::Utc;
    use uuid::Uuid;

    fn budget_for_month(month: NaiveDate) -> Budget {
        let timestamp = Utc::now().naive_utc();

        Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: String::from("Groceries"),
            category: BudgetCategory::Expenses,
            description: None,
            examples: None,
            planned_amount: 500.0,
            month,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    #[test]
    fn test_validate_amount_rejects_non_positive_and_non_finite() {
        assert!(validate_amount(50.0).is_ok());
        assert!(validate_amount(0.01).is_ok());

        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-12.5).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_description_bounds() {
        assert!(validate_description("market").is_ok());
        assert!(validate_description(&"a".repeat(100)).is_ok());

        assert!(validate_description("").is_err());
        assert!(validate_description(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_date_must_fall_within_budget_month() {
        let budget = budget_for_month(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());

        assert!(
            validate_date_in_budget_month(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(), &budget)
                .is_ok()
        );
        assert!(
            validate_date_in_budget_month(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(), &budget)
                .is_ok()
        );

        assert!(matches!(
            validate_date_in_budget_month(NaiveDate::from_ymd_opt(2023, 8, 31).unwrap(), &budget),
            Err(ServerError::InputRejected(_))
        ));
        assert!(matches!(
            validate_date_in_budget_month(NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(), &budget),
            Err(ServerError::InputRejected(_))
        ));
    }
}
