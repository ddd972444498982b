use chrono::{NaiveDate, Utc};
use diesel::{dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::dates;
use crate::db::{DaoError, DbThreadPool};
use crate::models::budget::{Budget, BudgetCategory, BudgetChangeset, NewBudget};
use crate::request_io::{InputBudget, InputEditBudget};
use crate::schema::budgets as budget_fields;
use crate::schema::budgets::dsl::budgets;

/// The owner-scoped filters a budget listing can apply. Cloned into the
/// page query and the count query so both see the same predicate.
#[derive(Clone, Debug)]
pub struct BudgetListFilter {
    pub user_id: Uuid,
    pub categories: Option<Vec<BudgetCategory>>,
    pub month: Option<NaiveDate>,
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

    /// `month` defaults to the first day of the current month and is
    /// normalized to the first day of its month when supplied. Duplicate
    /// (name, month) pairs for the owner surface as a unique violation.
    pub fn create_budget(
        &mut self,
        budget_data: &InputBudget,
        user_id: Uuid,
    ) -> Result<Budget, DaoError> {
        let current_time = Utc::now().naive_utc();
        let month = budget_data
            .month
            .map(dates::month_start)
            .unwrap_or_else(|| dates::month_start(dates::today()));

        let new_budget = NewBudget {
            id: Uuid::new_v4(),
            user_id,
            name: &budget_data.name,
            category: budget_data.category,
            description: budget_data.description.as_deref(),
            examples: budget_data.examples.clone(),
            planned_amount: budget_data.planned_amount,
            month,
            created_at: current_time,
            updated_at: current_time,
        };

        Ok(dsl::insert_into(budgets)
            .values(&new_budget)
            .get_result::<Budget>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_budget(&mut self, budget_id: Uuid, user_id: Uuid) -> Result<Budget, DaoError> {
        Ok(budgets
            .filter(budget_fields::id.eq(budget_id))
            .filter(budget_fields::user_id.eq(user_id))
            .first::<Budget>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_budgets(
        &mut self,
        filter: &BudgetListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Budget>, DaoError> {
        let mut query = budgets
            .filter(budget_fields::user_id.eq(filter.user_id))
            .into_boxed();

        if let Some(categories) = &filter.categories {
            query = query.filter(budget_fields::category.eq_any(categories.clone()));
        }

        if let Some(month) = filter.month {
            query = query.filter(budget_fields::month.eq(month));
        }

        Ok(query
            .order(budget_fields::month.desc())
            .then_order_by(budget_fields::name.asc())
            .offset(offset)
            .limit(limit)
            .load::<Budget>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn count_budgets(&mut self, filter: &BudgetListFilter) -> Result<i64, DaoError> {
        let mut query = budgets
            .select(dsl::count_star())
            .filter(budget_fields::user_id.eq(filter.user_id))
            .into_boxed();

        if let Some(categories) = &filter.categories {
            query = query.filter(budget_fields::category.eq_any(categories.clone()));
        }

        if let Some(month) = filter.month {
            query = query.filter(budget_fields::month.eq(month));
        }

        Ok(query.first::<i64>(&mut self.db_thread_pool.get()?)?)
    }

    /// Applies only the fields present in `edits` and advances `updated_at`.
    /// Returns the updated row; a missing or foreign budget surfaces as
    /// `NotFound`.
    pub fn update_budget(
        &mut self,
        budget_id: Uuid,
        user_id: Uuid,
        edits: &InputEditBudget,
    ) -> Result<Budget, DaoError> {
        let changeset = BudgetChangeset {
            name: edits.name.clone(),
            category: edits.category,
            description: edits.description.clone(),
            examples: edits.examples.clone(),
            planned_amount: edits.planned_amount,
            month: edits.month.map(dates::month_start),
            updated_at: Utc::now().naive_utc(),
        };

        Ok(diesel::update(
            budgets
                .filter(budget_fields::id.eq(budget_id))
                .filter(budget_fields::user_id.eq(user_id)),
        )
        .set(&changeset)
        .get_result::<Budget>(&mut self.db_thread_pool.get()?)?)
    }

    /// Returns the number of deleted rows. The budget's transactions go
    /// with it via the schema's cascading foreign key.
    pub fn delete_budget(&mut self, budget_id: Uuid, user_id: Uuid) -> Result<usize, DaoError> {
        Ok(diesel::delete(
            budgets
                .filter(budget_fields::id.eq(budget_id))
                .filter(budget_fields::user_id.eq(user_id)),
        )
        .execute(&mut self.db_thread_pool.get()?)?)
    }
}
