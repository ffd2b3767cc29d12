use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use foundation::{Clock, SystemClock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::key::{CacheKey, CacheNamespace, key_for};
use crate::store::{CacheEntry, CacheStore, DEFAULT_STORE_PREFIX, LocalStorageStore};

/// Maximum age of a cached entry, shared by every cache consumer.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Time-bounded key/value cache in front of a [`CacheStore`].
///
/// Clones share the same store. Lookups and writes are not serialized against
/// each other: a read racing a write may observe either value.
///
/// When no store is available the cache is disabled: `get` always misses and
/// `set`/`unset` are silently dropped. Callers cannot tell "disabled" from
/// "miss", and should not need to.
#[derive(Clone)]
pub struct TtlCache {
    store: Option<Rc<dyn CacheStore>>,
    clock: Rc<dyn Clock>,
    ttl: Duration,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("available", &self.is_available())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TtlCache {
    pub fn new(store: Rc<dyn CacheStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            store: Some(store),
            clock,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            clock: Rc::new(SystemClock),
            ttl: DEFAULT_TTL,
        }
    }

    /// Cache backed by browser local storage, or a disabled cache when the
    /// page has no storage facility.
    pub fn local_storage() -> Self {
        match LocalStorageStore::new(DEFAULT_STORE_PREFIX) {
            Ok(store) => Self::new(Rc::new(store), Rc::new(SystemClock)),
            Err(err) => {
                warn!(%err, "cache disabled");
                Self::disabled()
            }
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn key_for(&self, logical: &str, namespace: CacheNamespace) -> CacheKey {
        key_for(logical, namespace)
    }

    /// Cached payload for `key`, if present and no older than the TTL.
    ///
    /// Expired or undecodable entries are removed as a side effect.
    pub fn get<V: DeserializeOwned>(&self, key: &CacheKey) -> Option<V> {
        let store = self.store.as_ref()?;

        let entry = match store.load(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(%key, "cache miss");
                return None;
            }
            Err(err) => {
                warn!(%key, %err, "cache read failed");
                return None;
            }
        };

        let age_ms = self.clock.now_ms().saturating_sub(entry.created_at_ms);
        if u128::from(age_ms) > self.ttl.as_millis() {
            debug!(%key, age_ms, "cache expired");
            self.remove(store.as_ref(), key);
            return None;
        }

        match serde_json::from_value::<V>(entry.payload) {
            Ok(v) => {
                debug!(%key, age_ms, "cache hit");
                Some(v)
            }
            Err(err) => {
                warn!(%key, %err, "cache entry undecodable, dropping");
                self.remove(store.as_ref(), key);
                None
            }
        }
    }

    pub fn set<V: Serialize + ?Sized>(&self, key: &CacheKey, value: &V) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let payload = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(err) => {
                warn!(%key, %err, "cache payload not serializable");
                return;
            }
        };
        let entry = CacheEntry {
            payload,
            created_at_ms: self.clock.now_ms(),
        };
        if let Err(err) = store.save(key, &entry) {
            warn!(%key, %err, "cache write failed");
        }
    }

    pub fn unset(&self, key: &CacheKey) {
        if let Some(store) = self.store.as_ref() {
            self.remove(store.as_ref(), key);
        }
    }

    fn remove(&self, store: &dyn CacheStore, key: &CacheKey) {
        if let Err(err) = store.remove(key) {
            warn!(%key, %err, "cache remove failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TTL, TtlCache};
    use crate::key::{CacheNamespace, key_for};
    use crate::store::{CacheEntry, CacheStore, MemoryStore};
    use foundation::ManualClock;
    use serde_json::json;
    use std::rc::Rc;
    use std::time::Duration;

    fn cache() -> (TtlCache, Rc<MemoryStore>, ManualClock) {
        let store = Rc::new(MemoryStore::new());
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = TtlCache::new(store.clone(), Rc::new(clock.clone()));
        (cache, store, clock)
    }

    #[test]
    fn set_then_get_returns_value() {
        let (cache, _store, _clock) = cache();
        let k = key_for("/id/1/geojson", CacheNamespace::Feature);
        cache.set(&k, &json!({"name": "x"}));
        assert_eq!(cache.get::<serde_json::Value>(&k), Some(json!({"name": "x"})));
    }

    #[test]
    fn absent_without_set_and_after_unset() {
        let (cache, _store, _clock) = cache();
        let k = key_for("/id/1/geojson", CacheNamespace::Feature);
        assert_eq!(cache.get::<String>(&k), None);

        cache.set(&k, "label");
        cache.unset(&k);
        assert_eq!(cache.get::<String>(&k), None);

        // Unsetting a missing key is a no-op.
        cache.unset(&k);
    }

    #[test]
    fn entry_at_ttl_is_still_fresh() {
        let (cache, _store, clock) = cache();
        let k = key_for("/a", CacheNamespace::Feature);
        cache.set(&k, &1u32);
        clock.advance(DEFAULT_TTL);
        assert_eq!(cache.get::<u32>(&k), Some(1));
    }

    #[test]
    fn expired_entry_is_absent_and_removed() {
        let (cache, store, clock) = cache();
        let k = key_for("/a", CacheNamespace::Feature);
        cache.set(&k, &1u32);
        clock.advance(DEFAULT_TTL + Duration::from_millis(1));
        assert_eq!(cache.get::<u32>(&k), None);
        assert!(!store.contains(&k));
    }

    #[test]
    fn set_overwrites_and_refreshes_timestamp() {
        let (cache, _store, clock) = cache();
        let k = key_for("/a", CacheNamespace::Feature);
        cache.set(&k, "old");
        clock.advance(Duration::from_secs(20));
        cache.set(&k, "new");
        clock.advance(Duration::from_secs(20));
        assert_eq!(cache.get::<String>(&k).as_deref(), Some("new"));
    }

    #[test]
    fn undecodable_entries_are_dropped() {
        let (cache, store, clock) = cache();
        let k = key_for("/a", CacheNamespace::Feature);
        store
            .save(
                &k,
                &CacheEntry {
                    payload: json!("not a number"),
                    created_at_ms: clock_now(&clock),
                },
            )
            .unwrap();
        assert_eq!(cache.get::<u32>(&k), None);
        assert!(!store.contains(&k));
    }

    #[test]
    fn namespaces_are_isolated() {
        let (cache, _store, _clock) = cache();
        let feature_key = cache.key_for("/id/1/geojson", CacheNamespace::Feature);
        let label_key = cache.key_for("/id/1/geojson", CacheNamespace::Namify);
        cache.set(&feature_key, &json!({"type": "Feature"}));
        assert_eq!(cache.get::<String>(&label_key), None);
        cache.set(&label_key, "Montréal");
        assert_eq!(
            cache.get::<serde_json::Value>(&feature_key),
            Some(json!({"type": "Feature"}))
        );
    }

    #[test]
    fn disabled_cache_always_misses() {
        let cache = TtlCache::disabled();
        assert!(!cache.is_available());
        let k = key_for("/a", CacheNamespace::Feature);
        cache.set(&k, &1u32);
        assert_eq!(cache.get::<u32>(&k), None);
        cache.unset(&k);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn local_storage_falls_back_to_disabled_natively() {
        assert!(!TtlCache::local_storage().is_available());
    }

    #[test]
    fn clones_share_the_store() {
        let (cache, _store, _clock) = cache();
        let other = cache.clone().with_ttl(Duration::from_secs(5));
        let k = key_for("/a", CacheNamespace::Feature);
        other.set(&k, &7u8);
        assert_eq!(cache.get::<u8>(&k), Some(7));
        assert_eq!(other.ttl(), Duration::from_secs(5));
    }

    fn clock_now(clock: &ManualClock) -> u64 {
        use foundation::Clock;
        clock.now_ms()
    }
}
