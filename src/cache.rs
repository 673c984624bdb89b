use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: u64,
    expires_at: Instant,
}

/// In-process key-value store with per-entry TTL. Held behind an `Arc` in
/// application state and handed to consumers explicitly; nothing reaches it
/// through a global.
#[derive(Default)]
pub struct TtlCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl TtlCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, value: u64, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        // Opportunistic sweep so abandoned keys don't pile up
        entries.retain(|_, e| e.expires_at > Instant::now());
    }

    pub fn forget(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_live_values_only() {
        let cache = TtlCache::new();
        cache.put("k", 2, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(2));

        cache.put("gone", 1, Duration::from_millis(0));
        assert_eq!(cache.get("gone"), None);
    }

    #[test]
    fn forget_removes_entries() {
        let cache = TtlCache::new();
        cache.put("k", 1, Duration::from_secs(60));
        cache.forget("k");
        assert_eq!(cache.get("k"), None);
    }
}
