//! A small process-local key-value cache with per-entry expiry.
//!
//! Entries are evicted lazily: an expired entry is removed by the read
//! that finds it, or by [`TtlCache::purge_expired`].
//!
//! The cache lives in one process. When the server runs as several
//! instances behind a load balancer, a code issued by one instance is
//! unknown to the others; such deployments need a shared external store.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Outcome of [`TtlCache::take_with`] for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    /// Remove the entry and hand it to the caller.
    Consume,
    /// Leave the (possibly updated) entry in place.
    Keep,
    /// Remove the entry without returning it.
    Evict,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace `key`, restarting its expiry clock.
    pub async fn put(&self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.write().await.insert(key, (value, expires_at));
    }

    /// Fresh value for `key`. An expired entry is evicted and `None` returned.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some((value, expires_at)) if Instant::now() < *expires_at => {
                    return Some(value.clone());
                }
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().await;
        let expired = entries
            .get(key)
            .is_some_and(|(_, expires_at)| Instant::now() >= *expires_at);
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Inspect the fresh entry for `key` and let `decide` settle its fate.
    ///
    /// `decide` may mutate the value in place; the expiry clock is not
    /// restarted. The check and the removal happen under one write lock, so
    /// at most one caller can consume a given entry. Returns the value only
    /// on [`Take::Consume`].
    pub async fn take_with<F>(&self, key: &K, decide: F) -> Option<V>
    where
        F: FnOnce(&mut V) -> Take,
    {
        let mut entries = self.entries.write().await;
        let decision = match entries.get_mut(key) {
            None => return None,
            Some((_, expires_at)) if Instant::now() >= *expires_at => Take::Evict,
            Some((value, _)) => decide(value),
        };
        match decision {
            Take::Keep => None,
            Take::Evict => {
                entries.remove(key);
                None
            }
            Take::Consume => entries.remove(key).map(|(value, _)| value),
        }
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.remove(key).map(|(value, _)| value)
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| now < *expires_at);
        before - entries.len()
    }
}
