//! In-memory [`StateStore`] implementation.
//!
//! Backs tests and single-process embedding. TTLs are honored lazily: an
//! expired entry is dropped on the next access to its key.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{StateStore, StoreError};

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Zset(BTreeMap<i64, BTreeSet<String>>),
}

#[derive(Debug, Clone)]
struct Keyed {
    entry: Entry,
    expires_at: Option<Instant>,
}

impl Keyed {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe in-memory key-value store with per-key expiry and sorted
/// sets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Keyed>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(map: &mut HashMap<String, Keyed>, key: &str) {
        let now = Instant::now();
        if map.get(key).is_some_and(|k| k.expired(now)) {
            map.remove(key);
        }
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut map = self.inner.lock();
        Self::prune(&mut map, key);
        match map.get(key) {
            Some(Keyed {
                entry: Entry::Value(v),
                ..
            }) => Ok(Some(v.clone())),
            Some(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        map.insert(
            key.to_string(),
            Keyed {
                entry: Entry::Value(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut map = self.inner.lock();
        Self::prune(&mut map, key);
        if map.contains_key(key) {
            return Ok(false);
        }
        map.insert(
            key.to_string(),
            Keyed {
                entry: Entry::Value(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.lock().remove(key);
        Ok(())
    }

    fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        Self::prune(&mut map, key);
        let keyed = map.entry(key.to_string()).or_insert_with(|| Keyed {
            entry: Entry::Zset(BTreeMap::new()),
            expires_at: None,
        });
        match &mut keyed.entry {
            Entry::Zset(set) => {
                set.entry(score).or_default().insert(member.to_string());
                Ok(())
            }
            Entry::Value(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    fn zrange(&self, key: &str) -> Result<Vec<(i64, String)>, StoreError> {
        let mut map = self.inner.lock();
        Self::prune(&mut map, key);
        match map.get(key) {
            Some(Keyed {
                entry: Entry::Zset(set),
                ..
            }) => Ok(set
                .iter()
                .flat_map(|(score, members)| members.iter().map(|m| (*score, m.clone())))
                .collect()),
            Some(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        let mut emptied = false;
        if let Some(Keyed {
            entry: Entry::Zset(set),
            ..
        }) = map.get_mut(key)
        {
            set.retain(|_, members| {
                members.remove(member);
                !members.is_empty()
            });
            emptied = set.is_empty();
        }
        if emptied {
            map.remove(key);
        }
        Ok(())
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        Self::prune(&mut map, key);
        if let Some(keyed) = map.get_mut(key) {
            keyed.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_set_nx_only_first_writer_wins() {
        let store = MemoryStore::new();
        assert!(store
            .set_nx_with_ttl("flag", "1", Duration::from_secs(60))
            .unwrap());
        assert!(!store
            .set_nx_with_ttl("flag", "2", Duration::from_secs(60))
            .unwrap());
        assert_eq!(store.get("flag").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_ttl_expiry() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_millis(0))
            .unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_zset_ordering_and_removal() {
        let store = MemoryStore::new();
        store.zadd("z", 300, "c").unwrap();
        store.zadd("z", 100, "a").unwrap();
        store.zadd("z", 200, "b").unwrap();

        let members = store.zrange("z").unwrap();
        assert_eq!(
            members,
            vec![
                (100, "a".to_string()),
                (200, "b".to_string()),
                (300, "c".to_string())
            ]
        );

        store.zrem("z", "b").unwrap();
        let members = store.zrange("z").unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            store.zadd("k", 1, "m"),
            Err(StoreError::WrongType { .. })
        ));
    }
}
