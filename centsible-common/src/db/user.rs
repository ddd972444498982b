use chrono::Utc;
use diesel::{dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::dates;
use crate::db::{DaoError, DbThreadPool};
use crate::models::budget::{NewBudget, DEFAULT_CATALOG};
use crate::models::user::{NewUser, User};
use crate::schema::budgets::dsl::budgets;
use crate::schema::users as user_fields;
use crate::schema::users::dsl::users;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Inserts the user and provisions the default budget catalog for the
    /// current month in a single transaction.
    pub fn create_user(
        &mut self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DaoError> {
        let current_time = Utc::now().naive_utc();
        let month = dates::month_start(dates::today());

        let new_user = NewUser {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            is_active: true,
            is_admin: false,
            created_at: current_time,
            updated_at: current_time,
        };

        let mut db_connection = self.db_thread_pool.get()?;

        let user = db_connection
            .build_transaction()
            .run::<_, diesel::result::Error, _>(|conn| {
                let user = dsl::insert_into(users)
                    .values(&new_user)
                    .get_result::<User>(conn)?;

                let default_budgets = DEFAULT_CATALOG
                    .iter()
                    .map(|entry| NewBudget {
                        id: Uuid::new_v4(),
                        user_id: user.id,
                        name: entry.name,
                        category: entry.category,
                        description: None,
                        examples: if entry.examples.is_empty() {
                            None
                        } else {
                            Some(entry.examples.iter().map(|e| String::from(*e)).collect())
                        },
                        planned_amount: 0.0,
                        month,
                        created_at: current_time,
                        updated_at: current_time,
                    })
                    .collect::<Vec<_>>();

                dsl::insert_into(budgets)
                    .values(&default_budgets)
                    .execute(conn)?;

                Ok(user)
            })?;

        Ok(user)
    }

    pub fn get_user_by_username(&mut self, username: &str) -> Result<User, DaoError> {
        Ok(users
            .filter(user_fields::username.eq(username))
            .first::<User>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_user_by_id(&mut self, user_id: Uuid) -> Result<User, DaoError> {
        Ok(users
            .find(user_id)
            .first::<User>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_users(&mut self, offset: i64, limit: i64) -> Result<Vec<User>, DaoError> {
        Ok(users
            .order(user_fields::created_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<User>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn count_users(&mut self) -> Result<i64, DaoError> {
        Ok(users
            .count()
            .get_result::<i64>(&mut self.db_thread_pool.get()?)?)
    }

    /// Owned budgets and transactions go with the user via the schema's
    /// cascading foreign keys. Returns the number of deleted user rows.
    pub fn delete_user(&mut self, user_id: Uuid) -> Result<usize, DaoError> {
        Ok(diesel::delete(users.find(user_id)).execute(&mut self.db_thread_pool.get()?)?)
    }
}
