//! zID → display name lookups with a TTL cache
//!
//! 每条渲染的消息都经此解析标签，一页动态最多
//! 为近期未见过的姓名查询一次数据库。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::trace;

use crate::errors::Result;
use crate::storage::SeaOrmStorage;

#[derive(Clone)]
pub struct NameDirectory {
    storage: Arc<SeaOrmStorage>,
    /// `None` 表示缓存的未命中，未知标签不会每次都查库
    cache: Cache<String, Option<String>>,
}

impl NameDirectory {
    pub fn new(storage: Arc<SeaOrmStorage>, ttl_secs: u64, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(capacity)
            .build();
        Self { storage, cache }
    }

    /// `z_ids` 中存在的用户的姓名
    pub async fn resolve(&self, z_ids: &[String]) -> Result<HashMap<String, String>> {
        let mut names = HashMap::new();
        let mut missing = Vec::new();

        for z_id in z_ids {
            match self.cache.get(z_id).await {
                Some(Some(name)) => {
                    names.insert(z_id.clone(), name);
                }
                Some(None) => {}
                None => missing.push(z_id.clone()),
            }
        }

        if !missing.is_empty() {
            trace!("Name cache miss for {} ids", missing.len());
            let found = self.storage.display_names(&missing).await?;
            for z_id in missing {
                let name = found.get(&z_id).cloned();
                self.cache.insert(z_id.clone(), name.clone()).await;
                if let Some(name) = name {
                    names.insert(z_id, name);
                }
            }
        }

        Ok(names)
    }

    pub async fn name_of(&self, z_id: &str) -> Result<Option<String>> {
        let mut names = self.resolve(&[z_id.to_string()]).await?;
        Ok(names.remove(z_id))
    }

    pub async fn invalidate(&self, z_id: &str) {
        self.cache.invalidate(z_id).await;
    }
}
