use redis::{AsyncCommands, Client as RedisClient};

use crate::errors::AuthError;

pub const ACCESS_DENY_PREFIX: &str = "access_deny";
pub const REFRESH_DENY_PREFIX: &str = "refresh_deny";

/// Deny-list for revoked tokens. Entries expire when the token would have.
#[derive(Clone)]
pub struct TokenDenylist {
    client: RedisClient,
}

impl TokenDenylist {
    pub fn open(url: &str) -> Result<Self, AuthError> {
        RedisClient::open(url)
            .map(|client| TokenDenylist { client })
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }

    pub async fn revoke(&self, prefix: &str, token: &str, ttl_seconds: u64) -> Result<(), AuthError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(format!("{prefix}:{token}"), 1u8, ttl_seconds)
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }

    pub async fn is_revoked(&self, prefix: &str, token: &str) -> Result<bool, AuthError> {
        let mut conn = self.connection().await?;
        conn.exists(format!("{prefix}:{token}"))
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }

    pub async fn ping(&self) -> bool {
        match self.connection().await {
            Ok(mut conn) => {
                let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                matches!(pong.as_deref(), Ok("PONG"))
            }
            Err(_) => false,
        }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AuthError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }
}
