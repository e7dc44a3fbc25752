//! In-memory cache for analytics queries, keyed by resource and session.
//!
//! Analytics are computed per session on the server, so a cached payload is
//! only ever valid for the session it was fetched with. Keys carry the
//! session id; there is no way to address an entry without one.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::SessionId;

/// Default TTL for cached analytics (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Prune expired entries once the map grows past this size.
const PRUNE_THRESHOLD: usize = 100;

/// Cacheable analytics resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    ProductChart,
    CategoryChart,
    Insights,
}

impl Resource {
    pub const CHARTS: [Resource; 2] = [Resource::ProductChart, Resource::CategoryChart];
    pub const ALL: [Resource; 3] = [
        Resource::ProductChart,
        Resource::CategoryChart,
        Resource::Insights,
    ];

    /// API path of the resource.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::ProductChart => "/api/analytics/products/chart",
            Resource::CategoryChart => "/api/analytics/categories",
            Resource::Insights => "/api/analytics/ai",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::ProductChart => "products",
            Resource::CategoryChart => "categories",
            Resource::Insights => "insights",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound cache key. `session: None` is the unscoped (no active session)
/// view, which is cached separately from every real session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Resource,
    session: Option<SessionId>,
}

impl QueryKey {
    pub fn new(resource: Resource, session: Option<SessionId>) -> Self {
        Self { resource, session }
    }
}

/// A cached value with expiration time.
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn get(&self) -> Option<T> {
        if self.is_expired() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// Invalidation counter observed by a fetch before it went to the server.
///
/// A result may only be stored if no invalidation touched its key since the
/// epoch was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Default)]
struct Inner {
    entries: HashMap<QueryKey, CacheEntry<serde_json::Value>>,
    /// Last invalidation that covered each key.
    epochs: HashMap<QueryKey, u64>,
    /// Last `invalidate_all`.
    cleared: u64,
    counter: u64,
}

impl Inner {
    fn epoch(&self, key: &QueryKey) -> u64 {
        self.epochs.get(key).copied().unwrap_or(0).max(self.cleared)
    }

    fn bump(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

/// Session-keyed cache of raw JSON payloads.
pub struct QueryCache {
    inner: RwLock<Inner>,
    ttl: Duration,
}

impl QueryCache {
    /// Create a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            ttl,
        }
    }

    /// Cached payload, or None if expired/missing.
    pub fn get(&self, key: &QueryKey) -> Option<serde_json::Value> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.entries.get(key).and_then(|e| e.get()))
    }

    /// Current epoch of `key`. Take it before fetching and hand it to
    /// [`QueryCache::put_if_current`] with the result.
    pub fn epoch(&self, key: &QueryKey) -> Epoch {
        Epoch(self.inner.read().map(|guard| guard.epoch(key)).unwrap_or(0))
    }

    /// Store `value` unless `key` was invalidated after `epoch` was taken.
    /// Returns whether the value was stored.
    pub fn put_if_current(&self, key: QueryKey, value: serde_json::Value, epoch: Epoch) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        if guard.epoch(&key) != epoch.0 {
            return false;
        }
        self.insert(&mut guard, key, value);
        true
    }

    fn insert(&self, inner: &mut Inner, key: QueryKey, value: serde_json::Value) {
        inner.entries.insert(key, CacheEntry::new(value, self.ttl));
        if inner.entries.len() > PRUNE_THRESHOLD {
            inner.entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Drop one resource for one session.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Ok(mut guard) = self.inner.write() {
            let epoch = guard.bump();
            guard.epochs.insert(*key, epoch);
            guard.entries.remove(key);
        }
    }

    /// Drop every resource cached for a session (after an upload, a
    /// categorization change, or deletion of the session).
    pub fn invalidate_session(&self, session: Option<SessionId>) {
        if let Ok(mut guard) = self.inner.write() {
            let epoch = guard.bump();
            for resource in Resource::ALL {
                guard.epochs.insert(QueryKey::new(resource, session), epoch);
            }
            guard.entries.retain(|key, _| key.session != session);
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut guard) = self.inner.write() {
            let epoch = guard.bump();
            guard.cleared = epoch;
            guard.epochs.clear();
            guard.entries.clear();
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .map(|guard| guard.entries.values().filter(|e| !e.is_expired()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
