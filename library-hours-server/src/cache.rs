use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use library_hours_core::{Error, Result, cache::CacheBackend};

const DEFAULT_PREFIX: &str = "library-hours";

/// Redis 中的完整键：`<prefix>:<key>`
fn redis_key(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

/// SETEX 不接受 0 秒，不足一秒的 TTL 按一秒计
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn redis_error(action: &str, key: &str, err: redis::RedisError) -> Error {
    Error::Source {
        source_name: "redis".to_string(),
        message: format!("{} {} failed: {}", action, key, err),
    }
}

/// 表格缓存的 Redis 后端
#[derive(Debug, Clone)]
pub struct RedisCache {
    connection: redis::aio::MultiplexedConnection,
    prefix: String,
}

impl RedisCache {
    pub async fn new(redis_url: &str, prefix: Option<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Config(format!("Invalid REDIS_URL: {}", e)))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Config(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn set_raw(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let key = redis_key(&self.prefix, key);
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(&key, value, expiry_secs(ttl))
            .await
            .map_err(|e| redis_error("SETEX", &key, e))
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = redis_key(&self.prefix, key);
        let mut conn = self.connection.clone();
        conn.get::<_, Option<Vec<u8>>>(&key)
            .await
            .map_err(|e| redis_error("GET", &key, e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = redis_key(&self.prefix, key);
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| redis_error("DEL", &key, e))
    }
}

#[cfg(test)]
mod tests {
    use library_hours_core::cache::CacheManager;

    use super::*;

    #[test]
    fn workbook_key_is_prefixed() {
        let key = CacheManager::<RedisCache>::workbook_cache_key("https://example.org/hours.json");
        assert_eq!(
            redis_key(DEFAULT_PREFIX, &key),
            "library-hours:workbook:https://example.org/hours.json"
        );
        assert_eq!(redis_key("staging", "workbook:a"), "staging:workbook:a");
    }

    #[test]
    fn expiry_is_at_least_one_second() {
        assert_eq!(expiry_secs(Duration::from_secs(600)), 600);
        assert_eq!(expiry_secs(Duration::from_millis(1500)), 1);
        assert_eq!(expiry_secs(Duration::ZERO), 1);
    }

    #[test]
    fn redis_errors_name_the_key() {
        let err = redis_error(
            "GET",
            "library-hours:workbook:a",
            redis::RedisError::from((redis::ErrorKind::IoError, "connection reset")),
        );
        assert!(matches!(
            err,
            Error::Source { ref message, .. } if message.starts_with("GET library-hours:workbook:a")
        ));
    }
}
