//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn poisoned(backend: &str) -> Error {
    Error::runtime_with_context(
        "cache lock poisoned",
        ErrorContext::new().with_source(backend.to_string()),
    )
}

struct MemoryEntry {
    data: Vec<u8>,
    expires_at: u64,
}

/// In-process LRU cache.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().map_err(|_| poisoned("memory"))?;
        let expired = match entries.get(&key.hash) {
            Some(entry) if entry.expires_at > now_secs() => return Ok(Some(entry.data.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&key.hash);
        }
        Ok(None)
    }
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned("memory"))?;
        entries.put(
            key.hash.clone(),
            MemoryEntry { data: value.to_vec(), expires_at: now_secs().saturating_add(ttl.as_secs()) },
        );
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        let mut entries = self.entries.lock().map_err(|_| poisoned("memory"))?;
        Ok(entries.pop(&key.hash).is_some())
    }
    async fn clear(&self) -> Result<()> {
        self.entries.lock().map_err(|_| poisoned("memory"))?.clear();
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        let entries = self.entries.lock().map_err(|_| poisoned("memory"))?;
        let now = now_secs();
        Ok(entries.iter().filter(|(_, e)| e.expires_at > now).count())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Serialize, Deserialize)]
struct DiskEntry {
    expires_at: u64,
    data: serde_json::Value,
}

/// One JSON file per key under a directory, so results survive between runs.
///
/// Values must be JSON, which is all [`super::CacheManager`] ever stores.
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        // Keys are hex digests; anything else is flattened to stay inside `dir`.
        let file: String = key
            .hash
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }

    async fn read_entry(path: &Path) -> Result<Option<DiskEntry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl CacheBackend for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match Self::read_entry(&path).await? {
            Some(entry) if entry.expires_at > now_secs() => Ok(Some(serde_json::to_vec(&entry.data)?)),
            Some(_) => {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    debug!(path = %path.display(), error = %e, "failed to remove expired cache entry");
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()> {
        let entry = DiskEntry {
            expires_at: now_secs().saturating_add(ttl.as_secs()),
            data: serde_json::from_slice(value)?,
        };
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
    async fn clear(&self) -> Result<()> {
        for path in self.entry_paths().await? {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        let now = now_secs();
        let mut live = 0;
        for path in self.entry_paths().await? {
            if matches!(Self::read_entry(&path).await?, Some(e) if e.expires_at > now) {
                live += 1;
            }
        }
        Ok(live)
    }
    fn name(&self) -> &'static str {
        "disk"
    }
}

pub struct NullCache;
impl NullCache {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_memory_cache_evicts_least_recently_used() {
        let cache = MemoryCache::new(2);
        cache.set(&"a".into(), b"1", HOUR).await.unwrap();
        cache.set(&"b".into(), b"2", HOUR).await.unwrap();
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.get(&"a".into()).await.unwrap().is_some());
        cache.set(&"c".into(), b"3", HOUR).await.unwrap();

        assert!(cache.get(&"b".into()).await.unwrap().is_none());
        assert_eq!(cache.get(&"a".into()).await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_memory_cache_zero_ttl_expires() {
        let cache = MemoryCache::new(4);
        cache.set(&"k".into(), b"v", Duration::ZERO).await.unwrap();
        assert!(cache.get(&"k".into()).await.unwrap().is_none());
        assert!(!cache.delete(&"k".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_disk_cache_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let key = CacheKey::new("abc123");
        {
            let cache = DiskCache::open(dir.path()).unwrap();
            cache.set(&key, br#"{"status":"ok"}"#, HOUR).await.unwrap();
        }
        let reopened = DiskCache::open(dir.path()).unwrap();
        let data = reopened.get(&key).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disk_cache_delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(dir.path().join("nested")).unwrap();
        cache.set(&"one".into(), b"1", HOUR).await.unwrap();
        cache.set(&"two".into(), b"2", HOUR).await.unwrap();

        assert!(cache.delete(&"one".into()).await.unwrap());
        assert!(!cache.delete(&"one".into()).await.unwrap());
        cache.clear().await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_disk_cache_rejects_non_json_values() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        let err = cache.set(&"k".into(), b"not json", HOUR).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_disk_cache_keys_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        let path = cache.entry_path(&CacheKey::new("../escape"));
        assert!(path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_disk_cache_removes_expired_entry_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        let key = CacheKey::new("stale");
        cache.set(&key, b"1", Duration::ZERO).await.unwrap();
        assert!(cache.entry_path(&key).exists());

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(!cache.entry_path(&key).exists());
        assert_eq!(cache.len().await.unwrap(), 0);
    }
}
