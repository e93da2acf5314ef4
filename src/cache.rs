//! Process-wide response cache
//!
//! Caches final answers keyed by a normalized-query fingerprint so repeated
//! questions short-circuit retrieval and generation. Entries are evicted in
//! strict insertion order (FIFO, not LRU): a hit does not refresh an entry's
//! position. The cache is not keyed by session; identical questions from
//! different sessions share an entry, and the caller performs session
//! binding (turn append, context update) on every request, hit or miss.

use crate::classify::{Category, Intent};
use crate::retrieval::SourceRef;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default maximum number of cached answers
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Computes the cache key for a query: SHA-256 of the trimmed, lower-cased
/// text, hex-encoded.
///
/// # Examples
///
/// ```
/// use vialy::cache::fingerprint;
///
/// assert_eq!(fingerprint("  ¿Cuánto vale?  "), fingerprint("¿cuánto vale?"));
/// assert_ne!(fingerprint("multa soat"), fingerprint("multa licencia"));
/// ```
pub fn fingerprint(query: &str) -> String {
    let normalized = query.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A cached final answer with its response metadata
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub context_used: bool,
    pub category: Category,
    pub intent: Intent,
}

struct CacheInner {
    entries: HashMap<String, CachedAnswer>,
    /// Insertion order; front is the oldest entry and the next eviction
    order: VecDeque<String>,
}

/// Fixed-capacity FIFO cache of final answers
///
/// Shared across concurrently handled requests; all access goes through one
/// mutex so the eviction order cannot be corrupted by races.
pub struct ResponseCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Looks up a cached answer by fingerprint
    pub fn lookup(&self, fingerprint: &str) -> Option<CachedAnswer> {
        let inner = self.inner.lock().ok()?;
        inner.entries.get(fingerprint).cloned()
    }

    /// Inserts an answer, evicting the single oldest entry if at capacity
    ///
    /// Re-inserting an existing fingerprint replaces the value but keeps the
    /// entry's original position in the eviction order.
    pub fn insert(&self, fingerprint: String, entry: CachedAnswer) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        if inner.entries.contains_key(&fingerprint) {
            inner.entries.insert(fingerprint, entry);
            return;
        }

        if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(fingerprint.clone());
        inner.entries.insert(fingerprint, entry);
    }

    /// Drops all entries
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
            inner.order.clear();
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
