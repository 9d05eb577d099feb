//! TTL cache for archive listings.
//!
//! Keys carry the attachment id and upload timestamp, so a re-upload never
//! serves a stale listing. Values are entry-path lists; an EMPTY list is a
//! real value meaning "inspected, not a gallery" and suppresses re-opening
//! the archive until the entry expires. Recomputation is deterministic, so
//! concurrent misses racing to `put` are harmless.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Injectable cache seam; any key-value store with TTL satisfies it.
pub trait GalleryCache {
    fn get(&self, key: &str) -> Option<Vec<String>>;
    fn put(&self, key: &str, entries: Vec<String>, ttl: Duration);
}

/// Process-local implementation behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Vec<String>)>>,
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }
}

impl GalleryCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        // a poisoned lock degrades to a cache miss, never a panic.
        let mut map = self.entries.lock().ok()?;
        match map.get(key) {
            Some((expires, entries)) if *expires > Instant::now() => Some(entries.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, entries: Vec<String>, ttl: Duration) {
        let Some(expires) = Instant::now().checked_add(ttl) else {
            return;
        };
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), (expires, entries));
        }
    }
}
