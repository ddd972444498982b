use deadpool_redis::redis;
use std::fmt;
use std::time::Duration;

pub type RedisPool = deadpool_redis::Pool;
pub type RedisConnection = deadpool_redis::Connection;

#[derive(Debug)]
pub enum RevocationError {
    PoolFailure(deadpool_redis::PoolError),
    QueryFailed(Option<&'static str>),
    AlreadyBanned,
}

impl std::error::Error for RevocationError {}

impl fmt::Display for RevocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevocationError::PoolFailure(e) => {
                write!(f, "Failed to obtain Redis connection: {}", e)
            }
            RevocationError::QueryFailed(msg) => match msg {
                Some(msg) => write!(f, "Query failed: {}", msg),
                None => write!(f, "Query failed"),
            },
            RevocationError::AlreadyBanned => write!(f, "Token is already banned"),
        }
    }
}

impl From<deadpool_redis::PoolError> for RevocationError {
    fn from(error: deadpool_redis::PoolError) -> Self {
        RevocationError::PoolFailure(error)
    }
}

fn banned_token_key(token: &str) -> String {
    format!("centsible:banned_tokens:{}", token)
}

/// The registry of tokens that were signed out before their natural expiry.
/// Entries carry a TTL equal to the token's remaining lifetime, so the
/// backing store deletes them exactly when the token would have stopped
/// validating anyway.
pub struct Registry {
    redis_pool: RedisPool,
}

impl Registry {
    pub fn new(redis_pool: &RedisPool) -> Self {
        Self {
            redis_pool: redis_pool.clone(),
        }
    }

    pub async fn is_banned(&self, token: &str) -> Result<bool, RevocationError> {
        let mut redis_connection = self.redis_pool.get().await?;

        match redis::cmd("EXISTS")
            .arg(banned_token_key(token))
            .query_async::<u64>(&mut redis_connection)
            .await
        {
            Ok(count) => Ok(count > 0),
            Err(_) => Err(RevocationError::QueryFailed(None)),
        }
    }

    /// Records a token with a TTL of `remaining_lifetime` (clamped to at
    /// least one second; `SETEX` rejects zero). Banning a token that is
    /// already on the registry is an error.
    pub async fn ban_token(
        &self,
        token: &str,
        reason: &str,
        remaining_lifetime: Duration,
    ) -> Result<(), RevocationError> {
        if self.is_banned(token).await? {
            return Err(RevocationError::AlreadyBanned);
        }

        let ttl_secs = remaining_lifetime.as_secs().max(1);
        let mut redis_connection = self.redis_pool.get().await?;

        match redis::cmd("SETEX")
            .arg(banned_token_key(token))
            .arg(ttl_secs)
            .arg(reason)
            .query_async::<()>(&mut redis_connection)
            .await
        {
            Ok(()) => Ok(()),
            Err(_) => Err(RevocationError::QueryFailed(Some(
                "Failed to record banned token",
            ))),
        }
    }
}
