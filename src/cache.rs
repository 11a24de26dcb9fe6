use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Typed cache keys. Every invalidation goes through [`entry_dependents`],
/// never through ad-hoc string lists, so the dependent set stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    UserPhotos { user_id: i64 },
    ContestEntries { contest_id: i64 },
    ContestParticipation { user_id: i64, contest_id: i64 },
}

/// Every cached query whose result depends on the entries of one
/// (user, contest) pair.
pub fn entry_dependents(user_id: i64, contest_id: i64) -> [CacheKey; 3] {
    [
        CacheKey::UserPhotos { user_id },
        CacheKey::ContestEntries { contest_id },
        CacheKey::ContestParticipation {
            user_id,
            contest_id,
        },
    ]
}

/// Read-through query cache, shared per process (browser-tab equivalent).
/// Entries are invalidated, never locked; concurrent flows in separate
/// processes are not coordinated.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    slots: Arc<Mutex<HashMap<CacheKey, Value>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let slots = self.slots.lock().expect("cache lock");
        slots.get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: Value) {
        let mut slots = self.slots.lock().expect("cache lock");
        slots.insert(key, value);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        let slots = self.slots.lock().expect("cache lock");
        slots.contains_key(key)
    }

    pub fn invalidate(&self, keys: &[CacheKey]) {
        let mut slots = self.slots.lock().expect("cache lock");
        for key in keys {
            if slots.remove(key).is_some() {
                log::debug!("cache invalidated: {key:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalidate_removes_only_named_keys() {
        let cache = QueryCache::new();
        let photos = CacheKey::UserPhotos { user_id: 1 };
        let entries = CacheKey::ContestEntries { contest_id: 9 };
        cache.put(photos, json!([]));
        cache.put(entries, json!([]));

        cache.invalidate(&[photos]);
        assert!(!cache.contains(&photos));
        assert!(cache.contains(&entries));
    }

    #[test]
    fn dependency_table_covers_all_entry_queries() {
        let deps = entry_dependents(1, 9);
        assert!(deps.contains(&CacheKey::UserPhotos { user_id: 1 }));
        assert!(deps.contains(&CacheKey::ContestEntries { contest_id: 9 }));
        assert!(deps.contains(&CacheKey::ContestParticipation {
            user_id: 1,
            contest_id: 9
        }));
    }
}
