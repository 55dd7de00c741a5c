//! Offline cache of the last successfully fetched datasets.
//!
//! Entries never expire; they are replaced on every successful fetch and
//! wiped on logout. Reads only happen when the live fetch fails.

use chrono::Utc;
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::storage::Storage;

/// The four cached datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Account,
    History,
    Makes,
    Rules,
}

impl CacheKey {
    pub const ALL: [CacheKey; 4] = [
        CacheKey::Account,
        CacheKey::History,
        CacheKey::Makes,
        CacheKey::Rules,
    ];

    /// Durable storage key
    pub fn storage_key(self) -> &'static str {
        match self {
            CacheKey::Account => "cache.account",
            CacheKey::History => "cache.history",
            CacheKey::Makes => "cache.makes",
            CacheKey::Rules => "cache.rules",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A cached value and when it was written (milliseconds since the epoch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: i64,
    pub value: Value,
}

/// Best-effort cache over durable storage
#[derive(Clone)]
pub struct OfflineCache {
    storage: Arc<dyn Storage>,
}

impl OfflineCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn try_write<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<()> {
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            value: serde_json::to_value(value)?,
        };
        let json = serde_json::to_string(&entry)?;
        self.storage.set(key.storage_key(), &json)
    }

    pub fn try_read(&self, key: CacheKey) -> Result<Option<CacheEntry>> {
        match self.storage.get(key.storage_key())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn try_clear(&self, key: CacheKey) -> Result<()> {
        self.storage.remove(key.storage_key())
    }

    /// Write `value`, logging and swallowing any failure
    pub fn write<T: Serialize>(&self, key: CacheKey, value: &T) {
        if let Err(e) = self.try_write(key, value) {
            warn!("Cache write for {} failed: {}", key, e);
        }
    }

    /// Read the value under `key`; failures and null values read as absent
    pub fn read(&self, key: CacheKey) -> Option<Value> {
        match self.try_read(key) {
            Ok(entry) => entry.map(|e| e.value).filter(|v| !v.is_null()),
            Err(e) => {
                warn!("Cache read for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Read and decode the value under `key`; undecodable values read as absent
    pub fn read_as<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let value = self.read(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Cached {} has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn clear(&self, key: CacheKey) {
        if let Err(e) = self.try_clear(key) {
            warn!("Cache clear for {} failed: {}", key, e);
        }
    }

    pub fn clear_all(&self) {
        for key in CacheKey::ALL {
            self.clear(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    struct FullStorage;

    impl Storage for FullStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::cache("unavailable"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::cache("quota exceeded"))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::cache("unavailable"))
        }
    }

    #[test]
    fn write_then_read() {
        let cache = OfflineCache::new(Arc::new(MemoryStorage::new()));
        cache.write(CacheKey::Rules, &"No overnight parking");

        assert_eq!(cache.read(CacheKey::Rules), Some(json!("No overnight parking")));
        assert_eq!(cache.read(CacheKey::Account), None);

        let entry = cache.try_read(CacheKey::Rules).unwrap().unwrap();
        assert!(entry.timestamp > 0);
    }

    #[test]
    fn clear_all_removes_every_key() {
        let cache = OfflineCache::new(Arc::new(MemoryStorage::new()));
        for key in CacheKey::ALL {
            cache.write(key, &json!([1]));
        }
        cache.clear_all();
        for key in CacheKey::ALL {
            assert_eq!(cache.read(key), None);
        }
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let cache = OfflineCache::new(Arc::new(FullStorage));
        cache.write(CacheKey::Makes, &json!([]));
        assert_eq!(cache.read(CacheKey::Makes), None);
        cache.clear_all();
        assert!(cache.try_write(CacheKey::Makes, &json!([])).is_err());
    }

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("cache.history", "garbage").unwrap();
        let cache = OfflineCache::new(storage);
        assert_eq!(cache.read(CacheKey::History), None);
        assert!(cache.try_read(CacheKey::History).is_err());
    }
}
