use chrono::{NaiveDate, NaiveDateTime};
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::SmallInt;
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::budgets;

/// The four top-level groupings a budget can belong to. Stored as a
/// `SMALLINT` discriminant.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = SmallInt)]
#[serde(rename_all = "lowercase")]
pub enum BudgetCategory {
    Income,
    Deductions,
    Expenses,
    Savings,
}

#[derive(Debug)]
pub enum BudgetCategoryError {
    NoMatchForValue(i16),
    NoMatchForName(String),
}

impl std::error::Error for BudgetCategoryError {}

impl fmt::Display for BudgetCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetCategoryError::NoMatchForValue(v) => write!(f, "NoMatchForValue: {}", v),
            BudgetCategoryError::NoMatchForName(n) => write!(f, "NoMatchForName: {}", n),
        }
    }
}

impl BudgetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetCategory::Income => "income",
            BudgetCategory::Deductions => "deductions",
            BudgetCategory::Expenses => "expenses",
            BudgetCategory::Savings => "savings",
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BudgetCategory {
    type Err = BudgetCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(BudgetCategory::Income),
            "deductions" => Ok(BudgetCategory::Deductions),
            "expenses" => Ok(BudgetCategory::Expenses),
            "savings" => Ok(BudgetCategory::Savings),
            n => Err(BudgetCategoryError::NoMatchForName(String::from(n))),
        }
    }
}

impl From<BudgetCategory> for i16 {
    fn from(category: BudgetCategory) -> Self {
        match category {
            BudgetCategory::Income => 0,
            BudgetCategory::Deductions => 1,
            BudgetCategory::Expenses => 2,
            BudgetCategory::Savings => 3,
        }
    }
}

impl std::convert::TryFrom<i16> for BudgetCategory {
    type Error = BudgetCategoryError;

    fn try_from(value: i16) -> Result<Self, BudgetCategoryError> {
        match value {
            0 => Ok(BudgetCategory::Income),
            1 => Ok(BudgetCategory::Deductions),
            2 => Ok(BudgetCategory::Expenses),
            3 => Ok(BudgetCategory::Savings),
            v => Err(BudgetCategoryError::NoMatchForValue(v)),
        }
    }
}

impl ToSql<SmallInt, Pg> for BudgetCategory {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match self {
            BudgetCategory::Income => <i16 as ToSql<SmallInt, Pg>>::to_sql(&0, &mut out.reborrow()),
            BudgetCategory::Deductions => {
                <i16 as ToSql<SmallInt, Pg>>::to_sql(&1, &mut out.reborrow())
            }
            BudgetCategory::Expenses => {
                <i16 as ToSql<SmallInt, Pg>>::to_sql(&2, &mut out.reborrow())
            }
            BudgetCategory::Savings => <i16 as ToSql<SmallInt, Pg>>::to_sql(&3, &mut out.reborrow()),
        }
    }
}

impl FromSql<SmallInt, Pg> for BudgetCategory {
    fn from_sql(value: PgValue) -> deserialize::Result<Self> {
        let discriminant = <i16 as FromSql<SmallInt, Pg>>::from_sql(value)?;
        Ok(BudgetCategory::try_from(discriminant)?)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = budgets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Budget {
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

#[derive(Debug, Insertable)]
#[diesel(table_name = budgets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewBudget<'a> {
    pub id: Uuid,
    pub user_id: Uuid,

    pub name: &'a str,
    pub category: BudgetCategory,
    pub description: Option<&'a str>,
    pub examples: Option<Vec<String>>,
    pub planned_amount: f64,
    pub month: NaiveDate,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A partial update. `None` fields are left untouched by the database;
/// `updated_at` is always written.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = budgets)]
pub struct BudgetChangeset {
    pub name: Option<String>,
    pub category: Option<BudgetCategory>,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
    pub planned_amount: Option<f64>,
    pub month: Option<NaiveDate>,

    pub updated_at: NaiveDateTime,
}

pub struct DefaultBudget {
    pub name: &'static str,
    pub category: BudgetCategory,
    pub examples: &'static [&'static str],
}

/// The envelopes every new user starts with, provisioned for the month they
/// signed up in.
pub const DEFAULT_CATALOG: [DefaultBudget; 9] = [
    DefaultBudget {
        name: "Paycheck",
        category: BudgetCategory::Income,
        examples: &["salary", "wages"],
    },
    DefaultBudget {
        name: "Other Income",
        category: BudgetCategory::Income,
        examples: &["refunds", "gifts"],
    },
    DefaultBudget {
        name: "Taxes",
        category: BudgetCategory::Deductions,
        examples: &["federal", "state"],
    },
    DefaultBudget {
        name: "Insurance",
        category: BudgetCategory::Deductions,
        examples: &["health", "auto"],
    },
    DefaultBudget {
        name: "Housing",
        category: BudgetCategory::Expenses,
        examples: &["rent", "utilities"],
    },
    DefaultBudget {
        name: "Groceries",
        category: BudgetCategory::Expenses,
        examples: &["supermarket"],
    },
    DefaultBudget {
        name: "Transportation",
        category: BudgetCategory::Expenses,
        examples: &["fuel", "transit"],
    },
    DefaultBudget {
        name: "Emergency Fund",
        category: BudgetCategory::Savings,
        examples: &[],
    },
    DefaultBudget {
        name: "Investments",
        category: BudgetCategory::Savings,
        examples: &["brokerage", "retirement"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_discriminants_round_trip() {
        for category in [
            BudgetCategory::Income,
            BudgetCategory::Deductions,
            BudgetCategory::Expenses,
            BudgetCategory::Savings,
        ] {
            let discriminant = i16::from(category);
            assert_eq!(BudgetCategory::try_from(discriminant).unwrap(), category);
        }
    }

    #[test]
    fn test_category_rejects_unknown_discriminant() {
        assert!(BudgetCategory::try_from(4).is_err());
        assert!(BudgetCategory::try_from(-1).is_err());
    }

    #[test]
    fn test_category_parses_query_values() {
        assert_eq!(
            BudgetCategory::from_str("income").unwrap(),
            BudgetCategory::Income
        );
        assert_eq!(
            BudgetCategory::from_str("deductions").unwrap(),
            BudgetCategory::Deductions
        );
        assert!(BudgetCategory::from_str("Income").is_err());
        assert!(BudgetCategory::from_str("groceries").is_err());
    }

    #[test]
    fn test_category_serializes_as_lowercase_name() {
        assert_eq!(
            serde_json::to_string(&BudgetCategory::Expenses).unwrap(),
            "\"expenses\""
        );

        let parsed: BudgetCategory = serde_json::from_str("\"savings\"").unwrap();
        assert_eq!(parsed, BudgetCategory::Savings);
    }

    #[test]
    fn test_default_catalog_covers_every_category() {
        for category in [
            BudgetCategory::Income,
            BudgetCategory::Deductions,
            BudgetCategory::Expenses,
            BudgetCategory::Savings,
        ] {
            assert!(DEFAULT_CATALOG.iter().any(|b| b.category == category));
        }
    }
}
