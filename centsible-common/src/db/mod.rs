use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use std::fmt;

pub mod budget;
pub mod transaction;
pub mod user;

pub type DbThreadPool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_db_thread_pool(database_uri: &str, max_db_connections: Option<u32>) -> DbThreadPool {
    let mut pool_builder = diesel::r2d2::Pool::builder();

    if let Some(max_connections) = max_db_connections {
        pool_builder = pool_builder.max_size(max_connections);
    }

    pool_builder
        .build(ConnectionManager::new(database_uri))
        .expect("Failed to create DB thread pool")
}

#[derive(Debug)]
pub enum DaoError {
    DbThreadPoolFailure(r2d2::Error),
    QueryFailure(diesel::result::Error),
}

impl std::error::Error for DaoError {}

impl fmt::Display for DaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoError::DbThreadPoolFailure(e) => {
                write!(f, "DaoError: Failed to obtain DB connection: {}", e)
            }
            DaoError::QueryFailure(e) => {
                write!(f, "DaoError: Query failed: {}", e)
            }
        }
    }
}

impl From<r2d2::Error> for DaoError {
    fn from(error: r2d2::Error) -> Self {
        DaoError::DbThreadPoolFailure(error)
    }
}

impl From<diesel::result::Error> for DaoError {
    fn from(error: diesel::result::Error) -> Self {
        DaoError::QueryFailure(error)
    }
}

impl DaoError {
    /// True when the failure is the row simply not being there, which the
    /// HTTP layer reports as 404 rather than 500.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DaoError::QueryFailure(diesel::result::Error::NotFound)
        )
    }

    /// True when the failure is a violated unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DaoError::QueryFailure(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))
        )
    }
}
