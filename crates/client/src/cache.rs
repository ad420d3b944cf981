//! Local snapshot storage.
//!
//! A [`LocalCache`] is a small synchronous key-value store holding JSON
//! strings. Snapshots are best-effort: a broken cache must never block
//! the wizard, so callers log and continue on error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Errors from a local cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache poisoned")]
    Poisoned,
}

/// Synchronous key-value storage for session snapshots.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Cache backed by a mutex-guarded map. Used in tests and for callers
/// that do not want persistence across restarts.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Cache backed by one file per key under a directory. Survives
/// restarts, which is what makes offline resume work.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open a cache rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed known strings; sanitize anyway so a stray
        // separator cannot escape the cache directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").unwrap(), None);
        cache.set("k", "v").unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
        cache.remove("k").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn file_cache_roundtrip() {
        let dir = std::env::temp_dir().join(format!("onelink-cache-{}", std::process::id()));
        let cache = FileCache::new(&dir).unwrap();
        cache.set("onelink-onboarding", "{\"a\":1}").unwrap();
        assert_eq!(
            cache.get("onelink-onboarding").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        cache.remove("onelink-onboarding").unwrap();
        assert_eq!(cache.get("onelink-onboarding").unwrap(), None);
        // Removing again is a no-op, not an error.
        cache.remove("onelink-onboarding").unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_cache_sanitizes_keys() {
        let dir = std::env::temp_dir().join(format!("onelink-cache-keys-{}", std::process::id()));
        let cache = FileCache::new(&dir).unwrap();
        cache.set("../escape", "x").unwrap();
        assert_eq!(cache.get("../escape").unwrap().as_deref(), Some("x"));
        assert!(!dir.parent().unwrap().join("escape.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
