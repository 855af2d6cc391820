/// Per-execution-context values
///
/// A `ContextLocal<T>` stores one value per execution context, keyed by
/// the handle the driver reports as current. Lookups never use the thread
/// id: a context can migrate between threads.
///
/// Entries are created on first write and never evicted. Reads of a
/// context that was never written return the default value.
///
/// Insert and lookup go through a mutex, so a registry may be shared
/// between threads. The caller still owns the ordering between "context
/// made current" and any read keyed on it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use rustc_hash::FxHashMap;
use crate::driver::{ContextHandle, ContextSource};

/// One value of type `T` per execution context
pub struct ContextLocal<T: Clone> {
    default: T,
    values: Mutex<FxHashMap<ContextHandle, T>>,
}

impl<T: Clone> ContextLocal<T> {
    /// Empty registry returning `default` for unseen contexts
    pub fn new(default: T) -> Self {
        Self {
            default,
            values: Mutex::new(FxHashMap::default()),
        }
    }

    fn values(&self) -> MutexGuard<'_, FxHashMap<ContextHandle, T>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value for the context current on `source`
    pub fn get<S: ContextSource + ?Sized>(&self, source: &S) -> T {
        self.get_in(source.current_context())
    }

    /// Set the value for the context current on `source`
    pub fn set<S: ContextSource + ?Sized>(&self, source: &S, value: T) {
        self.set_in(source.current_context(), value);
    }

    /// Value for an explicit context
    pub fn get_in(&self, context: ContextHandle) -> T {
        self.values()
            .get(&context)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Set the value for an explicit context
    pub fn set_in(&self, context: ContextHandle, value: T) {
        self.values().insert(context, value);
    }

    /// Number of distinct contexts written so far
    pub fn contexts_seen(&self) -> usize {
        self.values().len()
    }
}

impl<T: Clone + Default> Default for ContextLocal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
#[path = "context_registry_tests.rs"]
mod tests;
