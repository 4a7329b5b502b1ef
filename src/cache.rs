//! Caller-owned memoization for expensive loads and stage results.
//!
//! Nothing in the pipeline caches on its own; a caller that wants reuse
//! creates a [`MemoCache`] and passes it where needed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::data::{DataSource, TemplateStore};
use crate::error::Result;

/// Memoizes fallible computations by key, handing out shared `Arc` values.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: HashMap<K, Arc<V>>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: Hash + Eq + Clone, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// A failed computation is not cached.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`.
    pub fn get_or_try_insert_with<F>(&mut self, key: &K, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(v) = self.entries.get(key) {
            self.hits += 1;
            return Ok(Arc::clone(v));
        }
        self.misses += 1;
        let value = Arc::new(compute()?);
        self.entries.insert(key.clone(), Arc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

/// Cache of loaded reference data keyed by its source description.
pub type StoreCache = MemoCache<DataSource, TemplateStore>;

impl StoreCache {
    /// Loads the store for `source`, reusing a previous load when possible.
    ///
    /// # Errors
    ///
    /// Propagates load errors from [`TemplateStore::load`].
    pub fn load(&mut self, source: &DataSource) -> Result<Arc<TemplateStore>> {
        let store = self.get_or_try_insert_with(source, || TemplateStore::load(source))?;
        debug!(hits = self.hits, misses = self.misses, "store cache");
        Ok(store)
    }
}
