//! Key-addressed asynchronous data cache.
//!
//! DESIGN
//! ======
//! `SessionCache` is the contract the session core needs from a query cache:
//! fetch-by-key with in-flight dedup, memoized results, targeted
//! invalidation, clear-all, direct writes, and per-key change notifications.
//! `QueryCache` is the in-memory, single-threaded implementation.
//!
//! Every write, invalidation or removal advances the entry's generation. A
//! fetch remembers the generation it started under and only writes its
//! result back if that generation is still current, so a slow background
//! read can never overwrite data written after it was issued.

#[cfg(test)]
#[path = "query_cache_test.rs"]
mod query_cache_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use super::subscription::{ListenerSet, Subscription};

/// Produces the future that loads a key from the backend.
pub type Fetcher = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<Value, QueryError>>>;

/// Callback invoked with the entry snapshot after every change to a key.
pub type QueryListener = dyn Fn(&QuerySnapshot);

/// Errors produced by cache fetches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The fetcher itself failed.
    #[error("{0}")]
    Failed(String),
    /// The entry was removed while this caller waited on another fetch.
    #[error("query `{0}` was discarded before it settled")]
    Discarded(String),
}

/// Point-in-time view of one cache entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySnapshot {
    pub data: Option<Value>,
    pub error: Option<String>,
    pub loading: bool,
    pub stale: bool,
}

/// Cache contract consumed by the session store and the pending-count loader.
#[async_trait(?Send)]
pub trait SessionCache {
    /// Return fresh cached data, join an in-flight fetch for `key`, or run `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error, or [`QueryError::Discarded`] when a joined
    /// fetch was dropped by [`SessionCache::clear`] or [`SessionCache::remove`].
    async fn fetch(&self, key: &str, fetcher: Fetcher) -> Result<Value, QueryError>;

    fn snapshot(&self, key: &str) -> QuerySnapshot;

    /// Write `value` as fresh data for `key`.
    fn set_data(&self, key: &str, value: Value);

    /// Mark `key` stale so the next fetch goes to the backend.
    fn invalidate(&self, key: &str);

    fn remove(&self, key: &str);

    /// Drop every entry.
    fn clear(&self);

    fn subscribe(&self, key: &str, listener: Rc<QueryListener>) -> Subscription;
}

struct InFlight {
    generation: u64,
    waiters: Vec<oneshot::Sender<Result<Value, QueryError>>>,
}

struct Entry {
    data: Option<Value>,
    error: Option<String>,
    stale: bool,
    generation: u64,
    inflight: Option<InFlight>,
}

impl Entry {
    fn new(generation: u64) -> Self {
        Self { data: None, error: None, stale: false, generation, inflight: None }
    }

    fn loading(&self) -> bool {
        self.inflight.as_ref().is_some_and(|f| f.generation == self.generation)
    }

    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.loading(),
            stale: self.stale,
        }
    }
}

struct CacheInner {
    entries: HashMap<String, Entry>,
    listeners: HashMap<String, ListenerSet<QueryListener>>,
    last_generation: u64,
    backend_fetches: u64,
}

impl CacheInner {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}

enum Plan {
    Hit(Value),
    Join(oneshot::Receiver<Result<Value, QueryError>>),
    Run(u64),
}

/// In-memory [`SessionCache`]. Cloning shares the same storage.
#[derive(Clone)]
pub struct QueryCache {
    inner: Rc<RefCell<CacheInner>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(CacheInner {
                entries: HashMap::new(),
                listeners: HashMap::new(),
                last_generation: 0,
                backend_fetches: 0,
            })),
        }
    }

    /// Number of fetchers actually run (cache misses), for diagnostics.
    #[must_use]
    pub fn backend_fetches(&self) -> u64 {
        self.inner.borrow().backend_fetches
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    #[must_use]
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.borrow().listeners.get(key).map_or(0, ListenerSet::len)
    }

    fn plan(&self, key: &str) -> Plan {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let fresh = inner.next_generation();
        let entry = inner.entries.entry(key.to_owned()).or_insert_with(|| Entry::new(fresh));

        if entry.loading() {
            let (tx, rx) = oneshot::channel();
            if let Some(flight) = entry.inflight.as_mut() {
                flight.waiters.push(tx);
            }
            return Plan::Join(rx);
        }
        if !entry.stale {
            if let Some(data) = &entry.data {
                return Plan::Hit(data.clone());
            }
        }

        // A superseded flight may still be running; its waiters move to this one.
        let waiters = entry.inflight.take().map(|f| f.waiters).unwrap_or_default();
        entry.inflight = Some(InFlight { generation: entry.generation, waiters });
        let generation = entry.generation;
        inner.backend_fetches += 1;
        Plan::Run(generation)
    }

    /// Record a fetch outcome. Returns the waiters that joined this flight.
    fn settle(
        &self,
        key: &str,
        generation: u64,
        result: &Result<Value, QueryError>,
    ) -> Vec<oneshot::Sender<Result<Value, QueryError>>> {
        let (waiters, changed) = {
            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.entries.get_mut(key) else {
                return Vec::new();
            };
            let ours = entry.inflight.as_ref().is_some_and(|f| f.generation == generation);
            if !ours {
                return Vec::new();
            }
            let waiters = entry.inflight.take().map(|f| f.waiters).unwrap_or_default();
            if entry.generation == generation {
                match result {
                    Ok(value) => {
                        entry.data = Some(value.clone());
                        entry.error = None;
                    }
                    Err(e) => {
                        entry.data = None;
                        entry.error = Some(e.to_string());
                    }
                }
                entry.stale = false;
                (waiters, true)
            } else {
                tracing::debug!(key, "discarding result of superseded fetch");
                (waiters, false)
            }
        };
        if changed {
            self.emit(key);
        }
        waiters
    }

    fn emit(&self, key: &str) {
        let (snapshot, listeners) = {
            let inner = self.inner.borrow();
            let snapshot = inner.entries.get(key).map(Entry::snapshot).unwrap_or_default();
            let listeners = inner.listeners.get(key).map(ListenerSet::snapshot).unwrap_or_default();
            (snapshot, listeners)
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[async_trait(?Send)]
impl SessionCache for QueryCache {
    async fn fetch(&self, key: &str, fetcher: Fetcher) -> Result<Value, QueryError> {
        match self.plan(key) {
            Plan::Hit(value) => {
                tracing::trace!(key, "query cache hit");
                Ok(value)
            }
            Plan::Join(rx) => rx.await.unwrap_or_else(|_| Err(QueryError::Discarded(key.to_owned()))),
            Plan::Run(generation) => {
                tracing::debug!(key, "query cache fetching");
                self.emit(key);
                let result = fetcher().await;
                for waiter in self.settle(key, generation, &result) {
                    if waiter.send(result.clone()).is_err() {
                        tracing::trace!(key, "query waiter went away");
                    }
                }
                result
            }
        }
    }

    fn snapshot(&self, key: &str) -> QuerySnapshot {
        self.inner.borrow().entries.get(key).map(Entry::snapshot).unwrap_or_default()
    }

    fn set_data(&self, key: &str, value: Value) {
        {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let generation = inner.next_generation();
            let entry = inner.entries.entry(key.to_owned()).or_insert_with(|| Entry::new(generation));
            entry.generation = generation;
            entry.data = Some(value);
            entry.error = None;
            entry.stale = false;
        }
        self.emit(key);
    }

    fn invalidate(&self, key: &str) {
        let existed = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let generation = inner.next_generation();
            match inner.entries.get_mut(key) {
                Some(entry) => {
                    entry.generation = generation;
                    entry.stale = true;
                    true
                }
                None => false,
            }
        };
        if existed {
            tracing::debug!(key, "query invalidated");
            self.emit(key);
        }
    }

    fn remove(&self, key: &str) {
        let removed = self.inner.borrow_mut().entries.remove(key).is_some();
        if removed {
            self.emit(key);
        }
    }

    fn clear(&self) {
        let keys: Vec<String> = self.inner.borrow_mut().entries.drain().map(|(key, _)| key).collect();
        tracing::debug!(entries = keys.len(), "query cache cleared");
        for key in keys {
            self.emit(&key);
        }
    }

    fn subscribe(&self, key: &str, listener: Rc<QueryListener>) -> Subscription {
        let set = self
            .inner
            .borrow_mut()
            .listeners
            .entry(key.to_owned())
            .or_insert_with(ListenerSet::new)
            .clone();
        let registration = set.add(listener);

        // Drop the key's set once its last listener goes away.
        let weak = Rc::downgrade(&self.inner);
        let key = key.to_owned();
        Subscription::new(move || {
            registration.cancel();
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Ok(mut inner) = inner.try_borrow_mut() else {
                tracing::trace!(key = %key, "cache busy, empty listener set kept");
                return;
            };
            if inner.listeners.get(&key).is_some_and(ListenerSet::is_empty) {
                inner.listeners.remove(&key);
            }
        })
    }
}
