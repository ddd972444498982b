use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::budget::{Budget, BudgetCategory};
use crate::models::transaction::Transaction;
use crate::models::user::User;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputToken {
    pub access_token: String,
    pub token_type: String,
}

impl OutputToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: String::from("bearer"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<User> for OutputUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputBudget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: BudgetCategory,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
    pub planned_amount: f64,
    pub month: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Budget> for OutputBudget {
    fn from(budget: Budget) -> Self {
        Self {
            id: budget.id,
            user_id: budget.user_id,
            name: budget.name,
            category: budget.category,
            description: budget.description,
            examples: budget.examples,
            planned_amount: budget.planned_amount,
            month: budget.month,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

/// A transaction enriched with its owning budget's category and name. The
/// two extra fields are denormalized into the response, never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Uuid,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub category: BudgetCategory,
    pub budget_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl OutputTransaction {
    pub fn from_parts(
        transaction: Transaction,
        category: BudgetCategory,
        budget_name: String,
    ) -> Self {
        Self {
            id: transaction.id,
            user_id: transaction.user_id,
            budget_id: transaction.budget_id,
            amount: transaction.amount,
            description: transaction.description,
            date: transaction.date,
            category,
            budget_name,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub prv: Option<String>,
    pub nxt: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputPage<T> {
    pub meta: PageMeta,
    pub items: Vec<T>,
}
