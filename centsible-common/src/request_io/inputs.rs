use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::budget::BudgetCategory;
use crate::validators;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl InputUser {
    pub fn validate_email_address(&self) -> validators::Validity {
        validators::validate_email_address(&self.email)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputBudget {
    pub name: String,
    pub category: BudgetCategory,
    pub planned_amount: f64,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
    pub month: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputEditBudget {
    pub name: Option<String>,
    pub category: Option<BudgetCategory>,
    pub planned_amount: Option<f64>,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
    pub month: Option<NaiveDate>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputTransaction {
    pub amount: f64,
    pub description: String,
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputEditTransaction {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub budget_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_budget_fields_default_to_absent() {
        let edits: InputEditBudget = serde_json::from_str("{\"planned_amount\": 250.0}").unwrap();

        assert_eq!(edits.planned_amount, Some(250.0));
        assert!(edits.name.is_none());
        assert!(edits.category.is_none());
        assert!(edits.description.is_none());
        assert!(edits.examples.is_none());
        assert!(edits.month.is_none());
    }

    #[test]
    fn test_edit_transaction_fields_default_to_absent() {
        let edits: InputEditTransaction =
            serde_json::from_str("{\"description\": \"market\"}").unwrap();

        assert_eq!(edits.description.as_deref(), Some("market"));
        assert!(edits.amount.is_none());
        assert!(edits.date.is_none());
        assert!(edits.budget_id.is_none());
    }
}
