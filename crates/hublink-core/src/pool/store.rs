//! Storage of per-scope slot arrays.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lock;
use super::scope::ScopeSlots;

/// Get-or-create access to the slot array of a scope key.
///
/// The pool only talks to this trait, so tests (or embedders with their
/// own registry) can hand it any storage.
pub trait HolderStore<C>: Send + Sync {
    /// The array for `key`, created with `size` slots if absent. An existing
    /// array keeps the size it was created with.
    fn get_or_create(&self, key: &str, size: usize) -> Arc<ScopeSlots<C>>;

    fn get(&self, key: &str) -> Option<Arc<ScopeSlots<C>>>;

    /// Every scope key with an array, sorted.
    fn keys(&self) -> Vec<String>;
}

/// Process-local store; the default for [`ConnectionPool`](super::ConnectionPool).
pub struct InMemoryHolderStore<C> {
    scopes: Mutex<HashMap<String, Arc<ScopeSlots<C>>>>,
}

impl<C> Default for InMemoryHolderStore<C> {
    fn default() -> Self {
        Self {
            scopes: Mutex::new(HashMap::new()),
        }
    }
}

impl<C> InMemoryHolderStore<C> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Send + Sync> HolderStore<C> for InMemoryHolderStore<C> {
    fn get_or_create(&self, key: &str, size: usize) -> Arc<ScopeSlots<C>> {
        let mut scopes = lock(&self.scopes);
        if let Some(scope) = scopes.get(key) {
            return Arc::clone(scope);
        }
        tracing::debug!(scope = key, size, "creating connection pool for scope");
        let scope = Arc::new(ScopeSlots::new(key, size));
        scopes.insert(key.to_string(), Arc::clone(&scope));
        scope
    }

    fn get(&self, key: &str) -> Option<Arc<ScopeSlots<C>>> {
        lock(&self.scopes).get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.scopes).keys().cloned().collect();
        keys.sort();
        keys
    }
}
