use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::cache::CacheBackend;
use crate::errors::AppError;

/// Reads the index, deletes its members and the index itself as one script,
/// so a concurrent put either lands before the drain (and is deleted) or
/// after it (and starts a fresh index). `unpack` is chunked to stay under
/// Lua's argument limit.
const INDEX_DRAIN_SCRIPT: &str = r#"
local members = redis.call('SMEMBERS', KEYS[1])
for i = 1, #members, 5000 do
    redis.call('DEL', unpack(members, i, math.min(i + 4999, #members)))
end
redis.call('DEL', KEYS[1])
return #members
"#;

/// Redis-backed cache. Entry writes and index updates go out in one atomic
/// pipeline so an entry is never live without being indexed.
#[derive(Clone)]
pub struct RedisCacheBackend {
    conn: MultiplexedConnection,
}

impl RedisCacheBackend {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis cache connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        indexes: &[String],
        index_ttl: Duration,
    ) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .ignore();
        for index in indexes {
            pipe.cmd("SADD").arg(index).arg(key).ignore();
            pipe.cmd("EXPIRE")
                .arg(index)
                .arg(index_ttl.as_secs().max(1))
                .ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn index_drain(&self, index: &str) -> Result<usize, AppError> {
        let mut conn = self.conn.clone();
        let removed: usize = redis::Script::new(INDEX_DRAIN_SCRIPT)
            .key(index)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backend() -> RedisCacheBackend {
        let url = std::env::var("MATCHING_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisCacheBackend::connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a live Redis (MATCHING_TEST_REDIS_URL)"]
    async fn test_drain_removes_members_and_index_in_one_call() {
        let backend = backend().await;
        let index = vec!["career:index:candidate:test-drain".to_string()];
        let ttl = Duration::from_secs(60);
        for key in ["career:profile:test-drain", "career:matches:test-drain"] {
            backend
                .set_with_ttl(key, "{}".to_string(), ttl, &index, ttl)
                .await
                .unwrap();
        }

        assert_eq!(backend.index_drain(&index[0]).await.unwrap(), 2);
        assert!(backend.get("career:profile:test-drain").await.unwrap().is_none());
        assert_eq!(backend.index_drain(&index[0]).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "needs a live Redis (MATCHING_TEST_REDIS_URL)"]
    async fn test_put_racing_a_drain_stays_reachable() {
        let backend = backend().await;
        let index = vec!["career:index:candidate:test-race".to_string()];
        let ttl = Duration::from_secs(60);

        let writer = backend.clone();
        let writes = tokio::spawn({
            let index = index.clone();
            async move {
                for n in 0..200 {
                    let key = format!("career:match_breakdown:test-race:{n}");
                    writer
                        .set_with_ttl(&key, "{}".to_string(), ttl, &index, ttl)
                        .await
                        .unwrap();
                }
            }
        });
        while !writes.is_finished() {
            backend.index_drain(&index[0]).await.unwrap();
        }
        writes.await.unwrap();
        backend.index_drain(&index[0]).await.unwrap();

        for n in 0..200 {
            let key = format!("career:match_breakdown:test-race:{n}");
            assert!(backend.get(&key).await.unwrap().is_none(), "{key} escaped invalidation");
        }
    }
}
