// Forecast cache: keeps raw weather responses per city for a limited time so repeated
// lookups from the menu do not hit the remote API again.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::{config::CacheConfig, reference::City};

#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub items_count: usize,
    pub size_bytes: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub eviction_count: usize,
}

struct CacheEntry {
    body: Bytes,
    expires_at: Instant,
}

pub struct ForecastCache {
    store: DashMap<City, CacheEntry>,
    config: CacheConfig,
    stats: Arc<RwLock<CacheStats>>,
    // expiry instant -> cities expiring then, oldest first
    expiry_index: RwLock<BTreeMap<Instant, HashSet<City>>>,
}

impl ForecastCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: DashMap::new(),
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
            expiry_index: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_seconds)
    }

    pub fn store(&self, city: City, body: Bytes, ttl: Option<Duration>) {
        self.cleanup();
        if self.config.max_entries == 0 {
            return;
        }

        let expires_at = Instant::now() + ttl.unwrap_or_else(|| self.default_ttl());
        if let Some((_, old)) = self.store.remove(&city) {
            self.forget(city, &old);
        } else if self.store.len() >= self.config.max_entries {
            self.evict_soonest();
        }

        {
            let mut stats = self.stats.write();
            stats.items_count += 1;
            stats.size_bytes += body.len();
        }
        self.expiry_index
            .write()
            .entry(expires_at)
            .or_default()
            .insert(city);
        self.store.insert(city, CacheEntry { body, expires_at });
        debug!(city = %city, "forecast cached");
    }

    pub fn get(&self, city: City) -> Option<Bytes> {
        self.cleanup();

        let hit = self.store.get(&city).map(|entry| entry.body.clone());
        let mut stats = self.stats.write();
        if hit.is_some() {
            stats.hit_count += 1;
        } else {
            stats.miss_count += 1;
        }
        hit
    }

    // None drops every city
    pub fn invalidate(&self, city: Option<City>) -> usize {
        let cities: Vec<City> = match city {
            Some(city) => vec![city],
            None => self.store.iter().map(|e| *e.key()).collect(),
        };

        let mut removed = 0;
        for city in cities {
            if let Some((_, entry)) = self.store.remove(&city) {
                self.forget(city, &entry);
                removed += 1;
            }
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn cleanup(&self) {
        let now = Instant::now();
        // check and pop under one guard
        let due: Vec<City> = {
            let mut index = self.expiry_index.write();
            let mut due = Vec::new();
            while index
                .first_key_value()
                .is_some_and(|(expires_at, _)| *expires_at <= now)
            {
                if let Some((_, cities)) = index.pop_first() {
                    due.extend(cities);
                }
            }
            due
        };

        for city in due {
            // a fresh store may have replaced the entry since its index key was popped
            if let Some((_, entry)) = self.store.remove_if(&city, |_, e| e.expires_at <= now) {
                let mut stats = self.stats.write();
                stats.expired_count += 1;
                stats.items_count -= 1;
                stats.size_bytes -= entry.body.len();
            }
        }
    }

    fn evict_soonest(&self) {
        let first = self.expiry_index.write().pop_first();
        if let Some((_, cities)) = first {
            for city in cities {
                if let Some((_, entry)) = self.store.remove(&city) {
                    let mut stats = self.stats.write();
                    stats.eviction_count += 1;
                    stats.items_count -= 1;
                    stats.size_bytes -= entry.body.len();
                }
            }
        }
    }

    fn forget(&self, city: City, entry: &CacheEntry) {
        {
            let mut index = self.expiry_index.write();
            if let Some(set) = index.get_mut(&entry.expires_at) {
                set.remove(&city);
                if set.is_empty() {
                    index.remove(&entry.expires_at);
                }
            }
        }
        let mut stats = self.stats.write();
        stats.items_count -= 1;
        stats.size_bytes -= entry.body.len();
    }
}
