use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// 原始字节缓存后端
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn set_raw(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// 缓存管理器，按数据源名称存取原始表格内容
#[derive(Clone)]
pub struct CacheManager<C: CacheBackend> {
    cache: C,
}

impl<C: CacheBackend> CacheManager<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn workbook_cache_key(source: &str) -> String {
        format!("workbook:{}", source)
    }

    pub async fn cache_workbook(&self, source: &str, bytes: &[u8], ttl: Duration) -> Result<()> {
        let key = Self::workbook_cache_key(source);
        self.cache.set_raw(&key, bytes, ttl).await
    }

    pub async fn get_cached_workbook(&self, source: &str) -> Result<Option<Vec<u8>>> {
        let key = Self::workbook_cache_key(source);
        self.cache.get_raw(&key).await
    }

    pub async fn remove_workbook_cache(&self, source: &str) -> Result<()> {
        let key = Self::workbook_cache_key(source);
        self.cache.delete(&key).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    /// 测试用的内存缓存，忽略TTL
    #[derive(Default)]
    pub(crate) struct MemoryCache {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryCache {
        pub(crate) fn keys(&self) -> Vec<String> {
            self.entries.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl CacheBackend for MemoryCache {
        async fn set_raw(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn workbook_round_trip() {
        let manager = CacheManager::new(MemoryCache::default());
        let ttl = Duration::from_secs(60);

        tokio_test::block_on(async {
            assert!(manager.get_cached_workbook("hours.json").await.unwrap().is_none());
            manager
                .cache_workbook("hours.json", b"{}", ttl)
                .await
                .unwrap();
            assert_eq!(
                manager.get_cached_workbook("hours.json").await.unwrap(),
                Some(b"{}".to_vec())
            );
            assert_eq!(manager.cache.keys(), vec!["workbook:hours.json".to_string()]);

            manager.remove_workbook_cache("hours.json").await.unwrap();
            assert!(manager.get_cached_workbook("hours.json").await.unwrap().is_none());
        });
    }
}
