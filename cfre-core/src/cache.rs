//! Bounded, time-expiring read cache for storage adapters.
//!
//! The calculation core never caches; caching belongs to the storage
//! adapter, which owns the TTL and the explicit [`TtlCache::invalidate`]
//! operation. [`CachedFactorStore`] wraps any [`FactorStore`] with
//! per-filter caching of successful lookups.

use crate::factor::EmissionFactor;
use crate::storage::{FactorFilter, FactorStore, StorageError};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted: Instant,
}

/// A bounded map whose entries expire after a fixed TTL.
///
/// Interior locking keeps the cache usable from concurrent calculations;
/// entries are evicted oldest-first once the capacity is reached.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be non-zero");
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Fetch a live entry, dropping it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            // Evict expired entries first, then the oldest live one
            entries.retain(|_, e| e.inserted.elapsed() < self.ttl);
            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Drop every entry immediately.
    pub fn invalidate(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`FactorStore`] wrapper caching successful lookups per filter.
///
/// Errors are never cached; a failing backend is retried on the next call.
pub struct CachedFactorStore<S> {
    inner: S,
    cache: TtlCache<FactorFilter, Vec<EmissionFactor>>,
}

impl<S: FactorStore> CachedFactorStore<S> {
    pub fn new(inner: S, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl, capacity),
        }
    }

    /// Drop all cached lookups, e.g. after a factor-library import.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl<S: FactorStore> FactorStore for CachedFactorStore<S> {
    fn find_factors(&self, filter: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError> {
        if let Some(hit) = self.cache.get(filter) {
            return Ok(hit);
        }
        let found = self.inner.find_factors(filter)?;
        self.cache.insert(filter.clone(), found.clone());
        Ok(found)
    }
}
