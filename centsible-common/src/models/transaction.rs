use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::transactions;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Uuid,

    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTransaction<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Uuid,

    pub amount: f64,
    pub description: &'a str,
    pub date: NaiveDate,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A partial update. `None` fields are left untouched by the database;
/// `updated_at` is always written.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = transactions)]
pub struct TransactionChangeset {
    pub budget_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,

    pub updated_at: NaiveDateTime,
}
