use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::CacheBackend;
use crate::errors::AppError;

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    indexes: HashMap<String, (HashSet<String>, Instant)>,
}

impl Inner {
    /// Drops expired entries and indexes. Runs on every write.
    fn sweep(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.indexes.retain(|_, (_, expires_at)| *expires_at > now);
    }
}

/// In-process backend used when no Redis URL is configured, and by tests.
/// Expired entries are dropped on read and swept on every write.
#[derive(Default)]
pub struct MemoryCacheBackend {
    inner: Mutex<Inner>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn sizes(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.entries.len(), inner.indexes.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Cache("memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                inner.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        indexes: &[String],
        index_ttl: Duration,
    ) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        inner.sweep(now);
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        for index in indexes {
            let slot = inner
                .indexes
                .entry(index.clone())
                .or_insert_with(|| (HashSet::new(), now));
            if slot.1 <= now {
                slot.0.clear();
            }
            slot.0.insert(key.to_string());
            slot.1 = now + index_ttl;
        }
        Ok(())
    }

    async fn index_drain(&self, index: &str) -> Result<usize, AppError> {
        let mut inner = self.lock()?;
        let Some((members, _)) = inner.indexes.remove(index) else {
            return Ok(0);
        };
        let removed = members.len();
        for key in members {
            inner.entries.remove(&key);
        }
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.entries.remove(key);
        Ok(())
    }
}
