use chrono::{NaiveDate, Utc};
use diesel::{dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::dates::DateRange;
use crate::db::{DaoError, DbThreadPool};
use crate::models::budget::{Budget, BudgetCategory};
use crate::models::transaction::{NewTransaction, Transaction, TransactionChangeset};
use crate::request_io::{InputEditTransaction, InputTransaction};
use crate::schema::budgets as budget_fields;
use crate::schema::budgets::dsl::budgets;
use crate::schema::transactions as transaction_fields;
use crate::schema::transactions::dsl::transactions;

/// Filters for a transaction listing. The category filter reaches through
/// the owning budget; the date range is inclusive on both ends.
#[derive(Clone, Debug)]
pub struct TransactionListFilter {
    pub user_id: Uuid,
    pub categories: Option<Vec<BudgetCategory>>,
    pub date_range: DateRange,
}

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Owner and budget references are copied from the already-resolved
    /// budget, never taken from the request.
    pub fn create_transaction(
        &mut self,
        transaction_data: &InputTransaction,
        date: NaiveDate,
        budget: &Budget,
    ) -> Result<Transaction, DaoError> {
        let current_time = Utc::now().naive_utc();

        let new_transaction = NewTransaction {
            id: Uuid::new_v4(),
            user_id: budget.user_id,
            budget_id: budget.id,
            amount: transaction_data.amount,
            description: &transaction_data.description,
            date,
            created_at: current_time,
            updated_at: current_time,
        };

        Ok(dsl::insert_into(transactions)
            .values(&new_transaction)
            .get_result::<Transaction>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_transaction(
        &mut self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Transaction, BudgetCategory, String), DaoError> {
        Ok(transactions
            .inner_join(budgets)
            .select((
                transaction_fields::all_columns,
                budget_fields::category,
                budget_fields::name,
            ))
            .filter(transaction_fields::id.eq(transaction_id))
            .filter(transaction_fields::user_id.eq(user_id))
            .first::<(Transaction, BudgetCategory, String)>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_transactions(
        &mut self,
        filter: &TransactionListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<(Transaction, BudgetCategory, String)>, DaoError> {
        let mut query = transactions
            .inner_join(budgets)
            .select((
                transaction_fields::all_columns,
                budget_fields::category,
                budget_fields::name,
            ))
            .filter(transaction_fields::user_id.eq(filter.user_id))
            .filter(
                transaction_fields::date
                    .between(filter.date_range.start, filter.date_range.end),
            )
            .into_boxed();

        if let Some(categories) = &filter.categories {
            query = query.filter(budget_fields::category.eq_any(categories.clone()));
        }

        Ok(query
            .order(transaction_fields::date.asc())
            .then_order_by(transaction_fields::created_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<(Transaction, BudgetCategory, String)>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn count_transactions(&mut self, filter: &TransactionListFilter) -> Result<i64, DaoError> {
        let mut query = transactions
            .inner_join(budgets)
            .select(dsl::count_star())
            .filter(transaction_fields::user_id.eq(filter.user_id))
            .filter(
                transaction_fields::date
                    .between(filter.date_range.start, filter.date_range.end),
            )
            .into_boxed();

        if let Some(categories) = &filter.categories {
            query = query.filter(budget_fields::category.eq_any(categories.clone()));
        }

        Ok(query.first::<i64>(&mut self.db_thread_pool.get()?)?)
    }

    /// Applies only the fields present in `edits` and advances `updated_at`.
    /// Cross-field checks (budget ownership, date-within-month) belong to
    /// the caller, which performs them before anything is written.
    pub fn update_transaction(
        &mut self,
        transaction_id: Uuid,
        user_id: Uuid,
        edits: &InputEditTransaction,
    ) -> Result<Transaction, DaoError> {
        let changeset = TransactionChangeset {
            budget_id: edits.budget_id,
            amount: edits.amount,
            description: edits.description.clone(),
            date: edits.date,
            updated_at: Utc::now().naive_utc(),
        };

        Ok(diesel::update(
            transactions
                .filter(transaction_fields::id.eq(transaction_id))
                .filter(transaction_fields::user_id.eq(user_id)),
        )
        .set(&changeset)
        .get_result::<Transaction>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn delete_transaction(
        &mut self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, DaoError> {
        Ok(diesel::delete(
            transactions
                .filter(transaction_fields::id.eq(transaction_id))
                .filter(transaction_fields::user_id.eq(user_id)),
        )
        .execute(&mut self.db_thread_pool.get()?)?)
    }
}
