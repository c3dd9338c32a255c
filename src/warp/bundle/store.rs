// SPDX-License-Identifier: MIT

//! Process-wide bundle registry
//!
//! Bundles are write-once. The store only grows through [`BundleStore::put`],
//! so expiry and capacity are enforced there, under the same write lock as
//! the insert. Reads never evict.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::field::FieldMap;
use crate::common::clock::{Clock, SystemClock};

/// Maximum resident age of a bundle, in seconds
pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

/// Maximum number of resident bundles
pub const DEFAULT_CAPACITY: usize = 256;

static GLOBAL_STORE: Lazy<Arc<BundleStore>> = Lazy::new(|| Arc::new(BundleStore::new()));

/// Opaque bundle identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    /// Fresh random 128-bit id rendered as 32 hex characters
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BundleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BundleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Immutable snapshot of named fields
#[derive(Debug, Clone)]
pub struct Bundle {
    id: BundleId,
    fields: FieldMap,
    created_at: DateTime<Utc>,
}

impl Bundle {
    pub fn id(&self) -> &BundleId {
        &self.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Store limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreConfig {
    /// Bundles at least this old are evicted on the next put
    pub ttl: Duration,
    /// Resident bundle cap; values below 1 are treated as 1
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

struct Entry {
    bundle: Arc<Bundle>,
    // Insertion order, breaks created_at ties
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<BundleId, Entry>,
    next_seq: u64,
}

impl Inner {
    fn evict_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now - entry.bundle.created_at < ttl);
        before - self.entries.len()
    }

    fn evict_oldest(&mut self) -> Option<BundleId> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.bundle.created_at, entry.seq))
            .map(|(id, _)| id.clone())?;
        self.entries.remove(&oldest);
        Some(oldest)
    }
}

/// Concurrency-safe registry of bundles with time- and count-based eviction
pub struct BundleStore {
    inner: RwLock<Inner>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl BundleStore {
    /// Store with default limits and the system clock
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_config(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let config = StoreConfig {
            capacity: config.capacity.max(1),
            ..config
        };
        Self {
            inner: RwLock::new(Inner::default()),
            config,
            clock,
        }
    }

    /// The store shared by every node in this process
    pub fn global() -> Arc<BundleStore> {
        Arc::clone(&GLOBAL_STORE)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register a new bundle and return its id.
    ///
    /// Expired bundles are dropped first; if the store is still full, the
    /// oldest remaining bundle is evicted. The insert itself never fails.
    ///
    /// # Panics
    ///
    /// Panics if the generated id is already resident.
    pub fn put(&self, fields: FieldMap) -> BundleId {
        let id = BundleId::generate();

        let mut inner = self.inner.write();
        let now = self.clock.now();

        let expired = inner.evict_expired(now, self.config.ttl);
        if expired > 0 {
            log::debug!("Evicted {} expired bundle(s)", expired);
        }

        while inner.entries.len() >= self.config.capacity {
            match inner.evict_oldest() {
                Some(evicted) => log::debug!("Store at capacity, evicted bundle {}", evicted),
                None => break,
            }
        }

        assert!(
            !inner.entries.contains_key(&id),
            "bundle id collision: {}",
            id
        );

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let bundle = Arc::new(Bundle {
            id: id.clone(),
            fields,
            created_at: now,
        });
        inner.entries.insert(id.clone(), Entry { bundle, seq });

        log::trace!("Stored bundle {} ({} resident)", id, inner.entries.len());
        id
    }

    /// Look up a resident bundle; `None` if unknown or evicted
    pub fn get(&self, id: &BundleId) -> Option<Arc<Bundle>> {
        let inner = self.inner.read();
        inner.entries.get(id).map(|entry| Arc::clone(&entry.bundle))
    }

    pub fn contains(&self, id: &BundleId) -> bool {
        self.inner.read().entries.contains_key(id)
    }

    /// Number of resident bundles, including any that have expired but not yet been evicted
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BundleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BundleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleStore")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}
